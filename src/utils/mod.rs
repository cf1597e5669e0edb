pub mod sequences;
pub mod tables;
pub mod translate;
pub mod treetime;
