// ABOUTME: Test support utilities.
// ABOUTME: Provides an in-memory host, scripted collaborators, and environment fixtures.

use std::sync::Once;

use chrono::{DateTime, Duration, Local, TimeZone};
use parking_lot::Mutex;

use stagehand::config::{Config, Environment};
use stagehand::deploy::Capabilities;
use stagehand::prompt::ScriptedPrompt;
use stagehand::release::Clock;
use stagehand::remote::Host;
use stagehand::serving::ServingLayerControl;
use stagehand::tasks::ProvisioningTask;

// Each test binary only uses some of these modules, so allow dead_code.
#[allow(dead_code)]
pub mod fake_host;

#[allow(unused_imports)]
pub use fake_host::{FakeHost, FakeLocal, Node, RecordingServing};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env()
            .add_directive("stagehand=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

#[allow(dead_code)]
pub const ROOT: &str = "/srv/shop";
#[allow(dead_code)]
pub const CURRENT: &str = "/srv/shop/dev";
#[allow(dead_code)]
pub const NEXT: &str = "/srv/shop/next";
#[allow(dead_code)]
pub const PREVIOUS: &str = "/srv/shop/previous";

/// Project file used by most tests: a generic git project with staging and production.
#[allow(dead_code)]
pub const PROJECT_YAML: &str = r#"
project_name: shop
vcs: git
repository: git@example.com:acme/shop.git
project_root: /srv/shop
use_sudo: false
default_branch:
  staging: master
  production: stable
environments:
  staging:
    host: deploy@staging.example.com
  production:
    host: deploy@www.example.com
    keep: 10
"#;

#[allow(dead_code)]
pub fn environment(yaml: &str, name: &str) -> Environment {
    Config::from_yaml(yaml)
        .unwrap()
        .environment(name)
        .unwrap()
}

#[allow(dead_code)]
pub fn staging() -> Environment {
    environment(PROJECT_YAML, "staging")
}

/// Clock starting at 2024-03-01 10:00:00 that advances one second per reading.
#[derive(Debug)]
pub struct SteppingClock {
    next: Mutex<DateTime<Local>>,
}

impl SteppingClock {
    pub fn starting_at(at: DateTime<Local>) -> Self {
        Self {
            next: Mutex::new(at),
        }
    }
}

impl Default for SteppingClock {
    fn default() -> Self {
        Self::starting_at(Local.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap())
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Local> {
        let mut next = self.next.lock();
        let now = *next;
        *next = now + Duration::seconds(1);
        now
    }
}

/// Collaborators for one workflow run against a [`FakeHost`].
pub struct Harness {
    pub env: Environment,
    pub host: FakeHost,
    pub local: FakeLocal,
    pub prompt: ScriptedPrompt,
    pub clock: SteppingClock,
}

#[allow(dead_code)]
impl Harness {
    pub fn new(env: Environment, host: FakeHost) -> Self {
        Self {
            env,
            host,
            local: FakeLocal::on_branch("master"),
            prompt: ScriptedPrompt::default(),
            clock: SteppingClock::default(),
        }
    }

    pub fn with_answers<const N: usize>(mut self, answers: [&str; N]) -> Self {
        self.prompt = ScriptedPrompt::new(answers);
        self
    }

    pub fn with_local_branch(mut self, branch: &str) -> Self {
        self.local = FakeLocal::on_branch(branch);
        self
    }

    pub fn remote(&self) -> Host<'_> {
        Host::new(&self.host, &self.host, self.env.use_sudo)
    }

    pub fn caps<'a>(
        &'a self,
        serving: &'a dyn ServingLayerControl,
        tasks: &'a dyn ProvisioningTask,
    ) -> Capabilities<'a> {
        Capabilities {
            host: self.remote(),
            local: &self.local,
            prompt: &self.prompt,
            serving,
            tasks,
            clock: &self.clock,
        }
    }
}
