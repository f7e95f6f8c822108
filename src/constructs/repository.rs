//! # Container Image
//!
//! The image lives in an ECR repository owned outside this stack. Only its
//! name is known here; account, region and URL suffix are filled in by the
//! provisioning engine.

use crate::graph::intrinsic::sub;
use serde_json::Value;

/// Image in an existing ECR repository of the deployment account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EcrImage {
    pub repository_name: String,
    pub tag: String,
}

impl EcrImage {
    pub fn new(repository_name: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            repository_name: repository_name.into(),
            tag: tag.into(),
        }
    }

    /// Image URI for the container definition
    pub fn image_uri(&self) -> Value {
        sub(format!(
            "${{AWS::AccountId}}.dkr.ecr.${{AWS::Region}}.${{AWS::URLSuffix}}/{}:{}",
            self.repository_name, self.tag
        ))
    }

    /// Repository ARN, for pull permissions
    pub fn repository_arn(&self) -> Value {
        sub(format!(
            "arn:${{AWS::Partition}}:ecr:${{AWS::Region}}:${{AWS::AccountId}}:repository/{}",
            self.repository_name
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::intrinsic::collect_references;
    use serde_json::json;
    use std::collections::BTreeSet;

    #[test]
    fn test_image_uri_uses_pseudo_parameters_only() {
        let image = EcrImage::new("running-log", "latest");
        assert_eq!(
            image.image_uri(),
            json!({
                "Fn::Sub": "${AWS::AccountId}.dkr.ecr.${AWS::Region}.${AWS::URLSuffix}/running-log:latest"
            })
        );

        let mut refs = BTreeSet::new();
        collect_references(&image.image_uri(), &mut refs);
        collect_references(&image.repository_arn(), &mut refs);
        assert!(refs.is_empty());
    }
}
