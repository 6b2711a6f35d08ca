pub mod consts;

pub const PROJECT_NAME: &str = "kubuild";
