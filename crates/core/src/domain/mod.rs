pub mod approval;
pub mod assignment;
pub mod function;
pub mod legal_entity;
pub mod policy;
