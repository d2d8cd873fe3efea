pub mod chunk;
pub mod job_role;
