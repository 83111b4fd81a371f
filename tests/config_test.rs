//! 配置加载与文件资源的集成测试

use std::fs;
use std::rc::Rc;

use scene_di::config::ConfigLoader;
use scene_di::infrastructure::{FileResourceLoader, ResourceFormat};
use scene_di::logging::LogFormat;
use scene_di::{AppContext, ContainerConfig, Dependent, ServiceCollection};
use serde::Deserialize;
use tempfile::TempDir;

#[derive(Deserialize)]
struct Difficulty {
    enemy_health: u32,
    label: String,
}

impl Dependent for Difficulty {}

#[test]
fn test_missing_config_file_gives_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let config = ConfigLoader::with_base_path(temp_dir.path().to_path_buf())
        .load_config()
        .unwrap();

    assert_eq!(config.resources.format, ResourceFormat::Json);
    assert_eq!(config.logging.format, LogFormat::Pretty);
}

#[test]
fn test_config_file_drives_file_resources() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("data");
    fs::create_dir_all(data_dir.join("Settings")).unwrap();
    fs::write(
        data_dir.join("Settings/Hard.toml"),
        "enemy_health = 250\nlabel = \"hard\"\n",
    )
    .unwrap();

    let config_dir = temp_dir.path().join(".config/scene-di");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(
        config_dir.join("config.toml"),
        format!(
            "[resources]\nroot = {:?}\nformat = \"toml\"\n\n[logging]\nlevel = \"debug\"\nformat = \"compact\"\n",
            data_dir.to_string_lossy()
        ),
    )
    .unwrap();

    let config: ContainerConfig = ConfigLoader::with_base_path(temp_dir.path().to_path_buf())
        .load_config()
        .unwrap();
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.format, LogFormat::Compact);

    let loader = FileResourceLoader::from_config(&config.resources);
    assert_eq!(loader.path_for("Settings/Hard"), data_dir.join("Settings/Hard.toml"));

    let context = AppContext::from_config(&config);
    let project = context
        .create_project_container(
            "project",
            vec![Box::new(|services: &mut ServiceCollection| {
                services.add_singleton_resource::<Difficulty>("Settings/Hard");
            })],
            None,
        )
        .unwrap();

    let difficulty = project.get_service::<Difficulty>().unwrap();
    assert_eq!(difficulty.enemy_health, 250);
    assert_eq!(difficulty.label, "hard");
    assert!(Rc::ptr_eq(&context.project().unwrap(), &project));
}
