pub mod apply;
pub mod cascade;
pub mod construct;
pub mod rollback;
