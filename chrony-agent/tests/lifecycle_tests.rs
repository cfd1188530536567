use chrony_agent::{Agent, AgentError, HostAgent, Instance, LockReport, Settings, UnitStatus};
use chrony_certs::{MemoryCredentialBackend, TlsKeyPair};
use chrony_config::{ConfigStore, MemoryConfigStore, CONFIG_HEADER};
use chrony_lock::{LockError, LockResult, LockStorage, MemoryLockStorage};
use chrony_system::{RecordingPackages, RecordingServices};
use pretty_assertions::assert_eq;
use std::fs;

type TestAgent<L = MemoryLockStorage> = Agent<
    MemoryConfigStore,
    MemoryCredentialBackend,
    L,
    RecordingPackages,
    RecordingServices,
>;

const DEFAULT_CONFIG: &str = "pool ntp.ubuntu.com iburst\n";

fn instance(name: &str, sources: &str) -> Instance {
    Instance {
        name: name.to_string(),
        sources: sources.to_string(),
        key_pairs: Vec::new(),
    }
}

fn agent(sources: &str) -> TestAgent {
    agent_with(instance("chrony", sources), MemoryLockStorage::new())
}

fn agent_with<L: LockStorage>(instance: Instance, lock: L) -> TestAgent<L> {
    Agent::new(
        instance,
        MemoryConfigStore::with_config(DEFAULT_CONFIG),
        MemoryCredentialBackend::new(),
        lock,
        RecordingPackages::new(),
        RecordingServices::new(),
    )
}

// ── install / config-changed ────────────────────────────────────

#[test]
fn fresh_install_configures_chrony() {
    let mut agent = agent("ntp://example.com?iburst=true");
    let status = agent.install_and_configure().unwrap();

    assert_eq!(status, UnitStatus::Active);
    assert_eq!(
        agent.transitions(),
        &[
            UnitStatus::Maintenance("installing chrony".to_string()),
            UnitStatus::Active,
        ]
    );
    assert_eq!(
        agent.packages().calls(),
        vec![
            "add-repository ppa:canonical-is-devops/chrony-charm".to_string(),
            "install chrony ca-certificates prometheus-chrony-exporter".to_string(),
        ]
    );

    let config = agent.config_store().read().unwrap();
    assert!(config.starts_with(&format!("{CONFIG_HEADER}\n\npool example.com iburst\n\n")));
    assert_eq!(
        agent.config_store().read_backup().unwrap().as_deref(),
        Some(DEFAULT_CONFIG)
    );
    assert_eq!(agent.services().restarts(), vec!["chrony".to_string()]);
    assert_eq!(agent.lock().owner().unwrap().as_deref(), Some("chrony"));
}

#[test]
fn unchanged_settings_do_not_restart() {
    let mut agent = agent("ntp://example.com");
    agent.install_and_configure().unwrap();
    agent.install_and_configure().unwrap();

    assert_eq!(agent.services().restarts().len(), 1);
    // Installed after the first run.
    assert_eq!(agent.packages().calls().len(), 2);
}

#[test]
fn second_run_keeps_original_backup() {
    let mut agent = agent("ntp://a.example");
    agent.install_and_configure().unwrap();
    let first = agent.config_store().read().unwrap();

    let mut changed = agent_with(instance("chrony", "ntp://b.example"), MemoryLockStorage::new());
    changed.config_store().write(&first).unwrap();
    changed.install_and_configure().unwrap();
    // The live file already carried the header, so nothing was backed up.
    assert!(!changed.config_store().has_backup().unwrap());
    assert!(changed.config_store().read().unwrap().contains("pool b.example\n"));
}

#[test]
fn invalid_sources_block_without_writing() {
    for sources in ["foobar", "ntp://example.com?foobar=true", "https://example.com"] {
        let mut agent = agent(sources);
        let status = agent.install_and_configure().unwrap();
        assert_eq!(
            status,
            UnitStatus::Blocked("invalid sources configuration".to_string()),
            "{sources}"
        );
        assert_eq!(agent.config_store().read().unwrap(), DEFAULT_CONFIG);
        assert!(!agent.config_store().has_backup().unwrap());
        assert!(agent.services().restarts().is_empty());
    }
}

#[test]
fn empty_sources_block() {
    for sources in ["", " , ,"] {
        let mut agent = agent(sources);
        let status = agent.install_and_configure().unwrap();
        assert_eq!(
            status,
            UnitStatus::Blocked("no time source configured".to_string())
        );
        assert_eq!(agent.config_store().read().unwrap(), DEFAULT_CONFIG);
    }
}

#[test]
fn lock_conflict_blocks_without_side_effects() {
    let mut agent = agent_with(
        instance("chrony-b", "ntp://example.com"),
        MemoryLockStorage::held_by("chrony-a"),
    );
    let status = agent.install_and_configure().unwrap();
    assert_eq!(
        status,
        UnitStatus::Blocked(
            "conflict: multiple chrony agents detected, remove the instance 'chrony-b'"
                .to_string()
        )
    );
    assert!(agent.packages().calls().is_empty());
    assert_eq!(agent.config_store().read().unwrap(), DEFAULT_CONFIG);
    assert_eq!(agent.lock().owner().unwrap().as_deref(), Some("chrony-a"));
}

#[test]
fn key_pairs_are_reconciled() {
    let mut inst = instance("chrony", "nts://example.com");
    inst.key_pairs = vec![
        TlsKeyPair::new("CERT-0", "KEY-0"),
        TlsKeyPair::new("CERT-1", "KEY-1"),
    ];
    let mut agent = agent_with(inst, MemoryLockStorage::new());
    agent.install_and_configure().unwrap();

    let stored = agent.credentials().read().unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[1], TlsKeyPair::new("CERT-1", "KEY-1"));
}

// ── remove ──────────────────────────────────────────────────────

#[test]
fn remove_restores_original_and_releases() {
    let mut agent = agent("ntp://example.com");
    agent.install_and_configure().unwrap();

    assert!(agent.remove().unwrap());
    assert_eq!(agent.config_store().read().unwrap(), DEFAULT_CONFIG);
    assert!(!agent.config_store().has_backup().unwrap());
    assert_eq!(
        agent.packages().calls().last().map(String::as_str),
        Some("remove prometheus-chrony-exporter")
    );
    assert_eq!(agent.services().restarts().len(), 2);
    assert_eq!(agent.lock().owner().unwrap(), None);
}

#[test]
fn remove_by_non_owner_does_nothing() {
    let mut agent = agent_with(
        instance("chrony-b", "ntp://example.com"),
        MemoryLockStorage::held_by("chrony-a"),
    );
    assert!(!agent.remove().unwrap());
    assert!(agent.packages().calls().is_empty());
    assert!(agent.services().restarts().is_empty());
    assert!(matches!(agent.transitions(), [UnitStatus::Blocked(_)]));
    assert_eq!(agent.lock().owner().unwrap().as_deref(), Some("chrony-a"));
}

/// Marker that cannot be deleted.
#[derive(Default)]
struct StuckLock(MemoryLockStorage);

impl LockStorage for StuckLock {
    fn read(&self) -> LockResult<Option<String>> {
        self.0.read()
    }

    fn create(&self, identity: &str) -> LockResult<bool> {
        self.0.create(identity)
    }

    fn remove(&self) -> LockResult<()> {
        Err(LockError::Io {
            path: "/var/lib/chrony-agent/lock".into(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
        })
    }
}

#[test]
fn failed_release_is_an_error() {
    let mut agent = agent_with(instance("chrony", "ntp://example.com"), StuckLock::default());
    agent.install_and_configure().unwrap();
    let err = agent.remove().unwrap_err();
    assert!(matches!(err, AgentError::Lock(LockError::Io { .. })));
}

// ── render / status ─────────────────────────────────────────────

#[test]
fn render_touches_nothing() {
    let agent = agent("nts://example.com?require=true&offset=-0.1");
    let config = agent.render().unwrap();
    assert!(config.contains("\npool example.com nts offset -0.1 require\n"));
    assert_eq!(agent.lock().owner().unwrap(), None);
    assert_eq!(agent.config_store().read().unwrap(), DEFAULT_CONFIG);
}

#[test]
fn render_reports_bad_sources() {
    assert!(matches!(agent("ntp://").render(), Err(AgentError::Source(_))));
    assert!(matches!(agent("").render(), Err(AgentError::Config(_))));
}

#[test]
fn status_reflects_lifecycle() {
    let mut agent = agent("ntp://example.com");
    let before = agent.status().unwrap();
    assert_eq!(before.lock, LockReport::Unowned);
    assert!(!before.installed);
    assert_eq!(before.managed, Some(false));
    assert_eq!(before.metrics_endpoint, "*:9123/metrics");

    agent.install_and_configure().unwrap();
    let after = agent.status().unwrap();
    assert_eq!(after.lock, LockReport::OwnedBySelf);
    assert!(after.installed);
    assert_eq!(after.managed, Some(true));
    assert_eq!(after.has_backup, Some(true));
    assert!(agent.is_owner().unwrap());
}

// ── Settings wiring ─────────────────────────────────────────────

#[test]
fn host_agent_loads_pem_files() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("server.crt"), "CERT").unwrap();
    fs::write(dir.path().join("server.key"), "KEY").unwrap();
    let path = dir.path().join("agent.toml");
    fs::write(
        &path,
        r#"
name = "chrony"
sources = "nts://example.com"

[[tls_key_pairs]]
certificate = "server.crt"
key = "server.key"

[paths]
config_file = "chrony.conf"
backup_file = "state/chrony.conf.bak"
certs_dir = "certs"
lock_file = "state/lock"
"#,
    )
    .unwrap();

    let settings = Settings::load(&path).unwrap();
    let agent = HostAgent::from_settings(&settings).unwrap();
    assert_eq!(
        agent.instance().key_pairs,
        vec![TlsKeyPair::new("CERT", "KEY")]
    );
    assert!(agent.render().unwrap().contains("pool example.com nts"));
    assert_eq!(agent.config_store().config_file(), dir.path().join("chrony.conf"));
}

#[test]
fn missing_pem_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("agent.toml");
    fs::write(
        &path,
        "name = \"chrony\"\n[[tls_key_pairs]]\ncertificate = \"a.crt\"\nkey = \"a.key\"\n",
    )
    .unwrap();
    let settings = Settings::load(&path).unwrap();
    assert!(matches!(
        HostAgent::from_settings(&settings),
        Err(AgentError::Io { .. })
    ));
}
