//! 项目容器与场景容器层级的集成测试

use std::rc::Rc;

use scene_di::infrastructure::MemoryResourceLoader;
use scene_di::{AppContext, Configurator, ContainerError, ContainerKind, ServiceCollection, ServiceProvider};

#[derive(Debug, PartialEq)]
struct Settings(&'static str);

struct Music;

fn registering(settings: &'static str) -> Vec<Box<dyn Configurator>> {
    vec![Box::new(move |services: &mut ServiceCollection| {
        services.add_instance(Settings(settings));
    })]
}

#[test]
fn test_scene_falls_back_to_project() {
    let context = AppContext::new(Rc::new(MemoryResourceLoader::new()));
    let project = context
        .create_project_container(
            "project",
            vec![Box::new(|services: &mut ServiceCollection| {
                services.add_instance(Music).add_instance(Settings("project"));
            })],
            None,
        )
        .unwrap();
    let scene = context.create_scene_container("level-1", Vec::new(), None).unwrap();

    let music = scene.get_service::<Music>().unwrap();
    assert!(Rc::ptr_eq(&music, &project.get_service::<Music>().unwrap()));
    assert_eq!(scene.stats().parent_fallbacks, 1);
}

#[test]
fn test_local_registration_shadows_parent() {
    let context = AppContext::default();
    let project = context
        .create_project_container("project", registering("project"), None)
        .unwrap();
    let scene = context
        .create_scene_container("level-1", registering("scene"), None)
        .unwrap();

    assert_eq!(*scene.get_service::<Settings>().unwrap(), Settings("scene"));
    assert_eq!(scene.stats().parent_fallbacks, 0);
    assert_eq!(project.stats().total_resolutions, 0);
}

#[test]
fn test_unregistered_everywhere_is_absent() {
    let context = AppContext::default();
    let _project = context.create_project_container("project", Vec::new(), None).unwrap();
    let scene = context.create_scene_container("level-1", Vec::new(), None).unwrap();

    assert!(scene.resolve::<Music>().unwrap().is_none());
}

#[test]
fn test_scene_without_project_has_no_parent() {
    let context = AppContext::default();
    let scene = context
        .create_scene_container("menu", registering("scene"), None)
        .unwrap();

    assert_eq!(scene.kind(), ContainerKind::Scene);
    assert!(scene.parent().is_none());
    assert!(scene.get_service::<Music>().is_none());
}

#[test]
fn test_dropped_project_is_no_longer_consulted() {
    let context = AppContext::default();
    let project = context
        .create_project_container("project", registering("project"), None)
        .unwrap();
    let scene = context.create_scene_container("level-1", Vec::new(), None).unwrap();
    assert!(scene.get_service::<Settings>().is_some());

    drop(project);

    assert!(scene.parent().is_none());
    assert!(scene.get_service::<Settings>().is_none());
}

#[test]
fn test_duplicate_project_container_is_fatal() {
    let context = AppContext::default();
    let _project = context.create_project_container("project", Vec::new(), None).unwrap();

    let err = context
        .create_project_container("project-2", Vec::new(), None)
        .unwrap_err();
    assert!(matches!(err, ContainerError::DuplicateProjectContainer { .. }));
    assert_eq!(context.project().unwrap().name(), "project");
}

#[test]
fn test_explicit_parent_without_context() {
    let root = ServiceProvider::builder("root")
        .configurator(|services: &mut ServiceCollection| {
            services.add_instance(Music);
        })
        .build(None)
        .unwrap();
    let child = ServiceProvider::builder("child").parent(&root).build(None).unwrap();

    assert_eq!(child.kind(), ContainerKind::Standalone);
    assert!(child.contains::<Music>());
    assert!(child.get_service::<Music>().is_some());
}
