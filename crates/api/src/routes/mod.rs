pub mod advisor;
pub mod data;
pub mod site;
pub mod strumenti;
