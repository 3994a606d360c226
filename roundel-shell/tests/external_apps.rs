//! External app supervision with real child processes

use std::fs;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use roundel_core::app::{AppManifest, AppState, RawManifest};
use roundel_shell::{
    scan_apps, AppLifecycleManager, AppRegistry, ContainerId, DirectoryStore, InstalledApp, ManifestStore,
    MemoryStore,
};

fn script_app(dir: &Path, id: &str, body: &str) -> InstalledApp {
    let app_dir = dir.join(id);
    fs::create_dir_all(&app_dir).unwrap();
    fs::write(app_dir.join("main.sh"), body).unwrap();

    let manifest = AppManifest::validate(&RawManifest {
        id,
        name: id,
        version: "0.1.0",
        mode: "external",
        entry: "main.sh",
        ..RawManifest::default()
    })
    .unwrap();
    InstalledApp { manifest, dir: app_dir }
}

fn manager(dir: &Path) -> AppLifecycleManager<MemoryStore> {
    let store = MemoryStore::new(vec![
        script_app(dir, "quick", "exit 3\n"),
        script_app(dir, "slow", "sleep 30\n"),
        script_app(dir, "stubborn", "trap '' TERM\nsleep 1\n"),
    ]);
    AppLifecycleManager::new(AppRegistry::new(), store, "/bin/sh")
}

/// Run `update` until `done` holds or five seconds pass
fn update_until<S: ManifestStore>(m: &mut AppLifecycleManager<S>, done: impl Fn(&AppLifecycleManager<S>) -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        m.update(10);
        if done(m) {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    false
}

#[test]
fn test_exited_process_is_reaped_without_terminate() {
    let dir = tempfile::tempdir().unwrap();
    let mut m = manager(dir.path());

    m.launch("quick", ContainerId(1)).unwrap();
    assert!(m.pid_of("quick").is_some());
    assert_eq!(m.active_id(), Some("quick"));

    assert!(update_until(&mut m, |m| !m.is_tracked("quick")));
    assert_eq!(m.active_id(), None);
    assert_eq!(m.state("quick"), AppState::Stopped);
}

#[test]
fn test_terminate_signals_and_reaps() {
    let dir = tempfile::tempdir().unwrap();
    let mut m = manager(dir.path());

    m.launch("slow", ContainerId(1)).unwrap();
    m.terminate("slow").unwrap();
    assert!(!m.is_tracked("slow"));
    assert_eq!(m.active_id(), None);

    // The child may need a moment to die after SIGTERM
    assert!(update_until(&mut m, |m| m.pending_exits() == 0));
}

#[test]
fn test_pause_and_resume_external() {
    let dir = tempfile::tempdir().unwrap();
    let mut m = manager(dir.path());

    m.launch("slow", ContainerId(1)).unwrap();
    m.pause("slow").unwrap();
    assert_eq!(m.state("slow"), AppState::Paused);
    m.resume("slow").unwrap();
    assert_eq!(m.state("slow"), AppState::Running);

    m.shutdown();
    assert!(m.running_apps().is_empty());
}

#[test]
fn test_process_ignoring_sigterm_stays_tracked_until_exit() {
    let dir = tempfile::tempdir().unwrap();
    let mut m = manager(dir.path());

    m.launch("stubborn", ContainerId(1)).unwrap();
    // Let the shell install its trap
    thread::sleep(Duration::from_millis(200));
    m.terminate("stubborn").unwrap();
    assert_eq!(m.pending_exits(), 1);

    // Exits on its own once the sleep finishes
    assert!(update_until(&mut m, |m| m.pending_exits() == 0));
}

#[test]
fn test_scanned_app_launches_from_its_directory() {
    let dir = tempfile::tempdir().unwrap();
    let app_dir = dir.path().join("sleeper");
    fs::create_dir_all(&app_dir).unwrap();
    fs::write(app_dir.join("main.sh"), "sleep 30\n").unwrap();
    fs::write(
        app_dir.join("manifest.toml"),
        "id = \"com.example.sleeper\"\nname = \"Sleeper\"\nversion = \"1.0.0\"\nmode = \"external\"\nentry = \"main.sh\"\n",
    )
    .unwrap();

    let catalog = scan_apps(dir.path());
    assert_eq!(catalog.len(), 1);
    let store = DirectoryStore::from_scan(dir.path(), &catalog);
    let mut m = AppLifecycleManager::new(AppRegistry::new(), store, "/bin/sh");

    m.launch(catalog[0].id(), ContainerId(1)).unwrap();
    assert_eq!(m.active_id(), Some("com.example.sleeper"));
    assert!(m.pid_of("com.example.sleeper").is_some());

    m.terminate("com.example.sleeper").unwrap();
    assert!(update_until(&mut m, |m| m.pending_exits() == 0));
}
