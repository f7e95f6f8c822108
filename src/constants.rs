//! # Constants
//!
//! Shared constants used throughout the synthesizer.
//!
//! These values represent the running-log production defaults and can be
//! overridden via configuration files or environment variables where applicable.

/// Stack name used when none is given on the command line or in the environment
pub const DEFAULT_STACK_NAME: &str = "running-log-prod";

/// Externally managed application secret (Flask configuration)
///
/// Must already exist before deployment; it is only ever referenced.
pub const FLASK_SECRET_ARN: &str =
    "arn:aws:secretsmanager:us-east-2:412703736941:secret:running-log/flask-6NPAP2";

/// Application name, used for the ECS cluster, ECR repository and container
pub const APP_NAME: &str = "running-log";

/// Prefix for every logical ID declared in the stack
pub const CONSTRUCT_PREFIX: &str = "RunningLog";

/// Address space of the application VPC
pub const DEFAULT_VPC_CIDR: &str = "10.0.0.0/16";

/// MySQL listener port, shared by the access rule and the database
pub const MYSQL_PORT: u16 = 3306;

/// HTTP port of the public load balancer and the container
pub const HTTP_PORT: u16 = 80;

/// Container environment entry carrying the database credential payload
pub const DATABASE_SECRET_ENV: &str = "AURORA_CREDS";

/// Container environment entry carrying the application secret payload
pub const APPLICATION_SECRET_ENV: &str = "FLASK_SECRET";

/// Default image tag pulled from the ECR repository
pub const DEFAULT_IMAGE_TAG: &str = "latest";

/// Length of generated database master passwords
pub const GENERATED_PASSWORD_LENGTH: u32 = 30;

/// Characters excluded from generated database passwords (RDS rejects these)
pub const GENERATED_PASSWORD_EXCLUDE: &str = " %+~`#$&*()|[]{}:;<>?!'/@\"\\";

/// Allocated storage for single-instance databases (GiB)
pub const DEFAULT_ALLOCATED_STORAGE_GIB: u32 = 100;

/// Master username RDS uses when none is configured
pub const DEFAULT_MASTER_USERNAME: &str = "admin";

/// Grace period before ALB health checks count against new tasks (seconds)
pub const HEALTH_CHECK_GRACE_PERIOD_SECS: u32 = 60;

/// CloudFormation template format version
pub const TEMPLATE_FORMAT_VERSION: &str = "2010-09-09";

/// Maximum length of a CloudFormation logical ID
pub const MAX_LOGICAL_ID_LEN: usize = 255;

/// CloudFormation limit on stack names
pub const MAX_STACK_NAME_LEN: usize = 128;
