mod repository;

pub use repository::{
    PgAuditLogRepository, PgDeploymentRepository, PgEnvVarRepository, PgProjectRepository,
};
