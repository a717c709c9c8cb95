pub(crate) mod bootstrap;
pub(crate) mod level_scene;
pub(crate) mod loop_runner;
pub(crate) mod settings;
