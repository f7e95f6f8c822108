//! # Intrinsic Functions
//!
//! Helpers that build CloudFormation intrinsic function values (`Ref`,
//! `Fn::GetAtt`, `Fn::Sub`, ...) and the inverse: extracting the logical IDs a
//! property tree refers to, which is how the stack enforces that references
//! only point backwards.

use super::LogicalId;
use serde_json::{json, Value};
use std::collections::BTreeSet;

/// Pseudo parameters resolved by the provisioning engine at deploy time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pseudo {
    AccountId,
    Partition,
    Region,
    StackName,
    UrlSuffix,
}

impl Pseudo {
    pub fn name(self) -> &'static str {
        match self {
            Pseudo::AccountId => "AWS::AccountId",
            Pseudo::Partition => "AWS::Partition",
            Pseudo::Region => "AWS::Region",
            Pseudo::StackName => "AWS::StackName",
            Pseudo::UrlSuffix => "AWS::URLSuffix",
        }
    }
}

/// `{"Ref": id}`
pub fn reference(id: &LogicalId) -> Value {
    json!({ "Ref": id.as_str() })
}

/// `{"Ref": "AWS::..."}`
pub fn pseudo(param: Pseudo) -> Value {
    json!({ "Ref": param.name() })
}

/// `{"Fn::GetAtt": [id, attribute]}`
pub fn get_att(id: &LogicalId, attribute: &str) -> Value {
    json!({ "Fn::GetAtt": [id.as_str(), attribute] })
}

/// `{"Fn::Sub": template}` using `${LogicalId}` / `${AWS::Region}` placeholders
pub fn sub(template: impl Into<String>) -> Value {
    json!({ "Fn::Sub": template.into() })
}

/// `{"Fn::Join": [delimiter, parts]}`
pub fn join(delimiter: &str, parts: Vec<Value>) -> Value {
    json!({ "Fn::Join": [delimiter, parts] })
}

/// `{"Fn::Select": [index, list]}`
pub fn select(index: usize, list: Value) -> Value {
    json!({ "Fn::Select": [index, list] })
}

/// `{"Fn::GetAZs": ""}`, the availability zones of the deployment region
pub fn get_azs() -> Value {
    json!({ "Fn::GetAZs": "" })
}

/// Collect every logical ID referenced from `value`
///
/// Pseudo parameters (`AWS::*`) and `Fn::Sub` local variables are skipped.
pub fn collect_references(value: &Value, out: &mut BTreeSet<String>) {
    match value {
        Value::Object(map) => {
            if map.len() == 1 {
                if let Some(Value::String(target)) = map.get("Ref") {
                    if !target.starts_with("AWS::") {
                        out.insert(target.clone());
                    }
                    return;
                }
                if let Some(Value::Array(args)) = map.get("Fn::GetAtt") {
                    if let Some(Value::String(target)) = args.first() {
                        out.insert(target.clone());
                    }
                    return;
                }
                if let Some(args) = map.get("Fn::Sub") {
                    collect_sub_references(args, out);
                    return;
                }
            }
            for nested in map.values() {
                collect_references(nested, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_references(item, out);
            }
        }
        _ => {}
    }
}

fn collect_sub_references(args: &Value, out: &mut BTreeSet<String>) {
    match args {
        Value::String(template) => {
            for name in sub_placeholders(template) {
                out.insert(name);
            }
        }
        Value::Array(parts) => {
            let Some(Value::String(template)) = parts.first() else {
                return;
            };
            let locals = match parts.get(1) {
                Some(Value::Object(vars)) => {
                    for var in vars.values() {
                        collect_references(var, out);
                    }
                    vars.keys().cloned().collect()
                }
                _ => BTreeSet::new(),
            };
            for name in sub_placeholders(template) {
                if !locals.contains(&name) {
                    out.insert(name);
                }
            }
        }
        _ => {}
    }
}

/// Names referenced by `${Name}` or `${Name.Attr}` placeholders
///
/// `${!Literal}` is an escape and names nothing.
fn sub_placeholders(template: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            break;
        };
        let token = &after[..end];
        if !token.starts_with('!') && !token.starts_with("AWS::") {
            let name = token.split('.').next().unwrap_or(token).trim();
            if !name.is_empty() {
                names.push(name.to_string());
            }
        }
        rest = &after[end + 1..];
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refs(value: &Value) -> Vec<String> {
        let mut out = BTreeSet::new();
        collect_references(value, &mut out);
        out.into_iter().collect()
    }

    fn id(name: &str) -> LogicalId {
        LogicalId::new(name).unwrap()
    }

    #[test]
    fn test_ref_and_get_att_are_collected() {
        let value = json!({
            "VpcId": reference(&id("Vpc")),
            "Groups": [get_att(&id("Sg"), "GroupId")],
        });
        assert_eq!(refs(&value), vec!["Sg", "Vpc"]);
    }

    #[test]
    fn test_pseudo_parameters_are_skipped() {
        let value = json!({
            "Region": pseudo(Pseudo::Region),
            "Image": sub("${AWS::AccountId}.dkr.ecr.${AWS::Region}.${AWS::URLSuffix}/app:latest"),
        });
        assert!(refs(&value).is_empty());
    }

    #[test]
    fn test_sub_placeholders_with_attributes_and_escapes() {
        let value = sub("{{resolve:secretsmanager:${DbSecret}:SecretString:username::}} ${Lb.DNSName} ${!Literal}");
        assert_eq!(refs(&value), vec!["DbSecret", "Lb"]);
    }

    #[test]
    fn test_sub_local_variables_are_not_references() {
        let value = json!({
            "Fn::Sub": ["http://${Host}/${Path}", { "Host": get_att(&id("Lb"), "DNSName") }]
        });
        assert_eq!(refs(&value), vec!["Lb", "Path"]);
    }

    #[test]
    fn test_nested_join_and_select() {
        let value = join(
            "",
            vec![json!("http://"), get_att(&id("Lb"), "DNSName")],
        );
        assert_eq!(refs(&value), vec!["Lb"]);
        assert!(refs(&select(0, get_azs())).is_empty());
    }
}
