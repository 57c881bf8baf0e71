pub mod agent;
pub mod projects;
pub mod publish;
pub mod translate;
