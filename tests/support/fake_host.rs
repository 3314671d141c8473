// ABOUTME: In-memory deployment target interpreting the commands stagehand issues.
// ABOUTME: Records every command line so tests can assert on ordering and content.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use stagehand::deploy::DeployError;
use stagehand::remote::{
    Command, CommandOutput, FileProbe, LocalExecutor, RemoteExecutor, Tolerance, check_output,
};
use stagehand::serving::ServingLayerControl;
use stagehand::types::RemotePath;

/// One entry of the fake filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Dir,
    File(String),
}

/// A command as the host saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    pub line: String,
    pub privileged: bool,
}

#[derive(Debug)]
struct State {
    tree: BTreeMap<String, Node>,
    log: Vec<Recorded>,
    failures: Vec<String>,
    responses: Vec<(String, String)>,
    server_branch: String,
    remote_branches: Vec<String>,
    status: String,
    stash_output: String,
}

impl Default for State {
    fn default() -> Self {
        Self {
            tree: BTreeMap::new(),
            log: Vec::new(),
            failures: Vec::new(),
            responses: Vec::new(),
            server_branch: "master".to_string(),
            remote_branches: vec!["master".to_string()],
            status: String::new(),
            stash_output: "No local changes to save\n".to_string(),
        }
    }
}

/// Remote host backed by a map of absolute paths.
#[derive(Debug, Default)]
pub struct FakeHost {
    state: Mutex<State>,
}

fn ok(stdout: impl Into<String>) -> CommandOutput {
    CommandOutput {
        exit_code: 0,
        stdout: stdout.into(),
        stderr: String::new(),
    }
}

fn failed(stderr: impl Into<String>) -> CommandOutput {
    CommandOutput {
        exit_code: 1,
        stdout: String::new(),
        stderr: stderr.into(),
    }
}

fn parent(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) | None => "/",
        Some(i) => &path[..i],
    }
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn absolute(cwd: Option<&RemotePath>, path: &str) -> String {
    match cwd {
        Some(dir) if !path.starts_with('/') => dir.join(path).to_string(),
        _ => RemotePath::new(path).to_string(),
    }
}

impl State {
    fn exists(&self, path: &str) -> bool {
        path == "/" || self.tree.contains_key(path)
    }

    fn is_dir(&self, path: &str) -> bool {
        path == "/" || matches!(self.tree.get(path), Some(Node::Dir))
    }

    fn mkdir_p(&mut self, path: &str) {
        let mut current = String::new();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current.push('/');
            current.push_str(segment);
            self.tree.entry(current.clone()).or_insert(Node::Dir);
        }
    }

    fn write(&mut self, path: &str, content: &str) {
        self.mkdir_p(parent(path));
        self.tree
            .insert(path.to_string(), Node::File(content.to_string()));
    }

    fn subtree(&self, path: &str) -> Vec<(String, Node)> {
        let prefix = format!("{path}/");
        self.tree
            .iter()
            .filter(|(k, _)| k.as_str() == path || k.starts_with(&prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn remove(&mut self, path: &str) {
        for (key, _) in self.subtree(path) {
            self.tree.remove(&key);
        }
    }

    fn copy(&mut self, from: &str, to: &str) {
        for (key, node) in self.subtree(from) {
            let relocated = format!("{to}{}", &key[from.len()..]);
            self.tree.insert(relocated, node);
        }
    }

    fn children(&self, dir: &str) -> Vec<String> {
        let prefix = if dir == "/" {
            "/".to_string()
        } else {
            format!("{dir}/")
        };
        self.tree
            .keys()
            .filter_map(|k| k.strip_prefix(&prefix))
            .filter(|rest| !rest.is_empty() && !rest.contains('/'))
            .map(String::from)
            .collect()
    }

    fn interpret(&mut self, command: &Command) -> CommandOutput {
        let cwd = command.cwd();
        let args = command.arg_values();
        let program = command.program();

        if program.ends_with("tasks.py") {
            return self.tasks(cwd, &args);
        }

        match (program, args.as_slice()) {
            ("mkdir", ["-p", path]) => {
                self.mkdir_p(&absolute(cwd, path));
                ok("")
            }
            ("mv", [from, to]) => {
                let (from, to) = (absolute(cwd, from), absolute(cwd, to));
                if !self.exists(&from) {
                    return failed(format!("mv: cannot stat '{from}': No such file or directory"));
                }
                if self.exists(&to) {
                    return failed(format!("mv: '{to}' already exists"));
                }
                if !self.is_dir(parent(&to)) {
                    return failed(format!("mv: cannot move to '{to}': No such directory"));
                }
                self.copy(&from, &to);
                self.remove(&from);
                ok("")
            }
            ("cp", ["-a", from, to]) => {
                let (from, mut to) = (absolute(cwd, from), absolute(cwd, to));
                if !self.exists(&from) {
                    return failed(format!("cp: cannot stat '{from}': No such file or directory"));
                }
                if self.is_dir(&to) {
                    to = format!("{to}/{}", basename(&from));
                }
                if !self.is_dir(parent(&to)) {
                    return failed(format!("cp: cannot create '{to}': No such directory"));
                }
                self.copy(&from, &to);
                ok("")
            }
            ("rm", ["-rf", path]) => {
                self.remove(&absolute(cwd, path));
                ok("")
            }
            ("rm", [path]) => {
                let path = absolute(cwd, path);
                if !self.exists(&path) {
                    return failed(format!("rm: cannot remove '{path}'"));
                }
                self.remove(&path);
                ok("")
            }
            ("ls", ["-1", path]) => {
                let path = absolute(cwd, path);
                if !self.is_dir(&path) {
                    return failed(format!("ls: cannot access '{path}'"));
                }
                let mut listing = self.children(&path).join("\n");
                listing.push('\n');
                ok(listing)
            }
            ("touch", [path]) => {
                let path = absolute(cwd, path);
                if !self.exists(&path) {
                    self.write(&path, "");
                }
                ok("")
            }
            ("ln", ["-s", target, link]) => {
                let link = absolute(cwd, link);
                if self.exists(&link) {
                    return failed(format!("ln: '{link}': File exists"));
                }
                self.write(&link, &format!("-> {target}"));
                ok("")
            }
            ("git", _) => self.git(cwd, &args),
            ("svn", _) => self.svn(cwd, &args),
            ("cvs", _) => self.cvs(cwd, &args),
            _ => ok(""),
        }
    }

    fn git(&mut self, cwd: Option<&RemotePath>, args: &[&str]) -> CommandOutput {
        let here = cwd.map(RemotePath::to_string).unwrap_or_default();
        match args {
            ["clone", "-b", branch, _repository, target] => {
                let target = absolute(cwd, target);
                if self.exists(&target) {
                    return failed(format!("fatal: destination path '{target}' already exists"));
                }
                self.mkdir_p(&format!("{target}/.git"));
                self.write(&format!("{target}/REVISION"), branch);
                ok("")
            }
            ["checkout", revision] => {
                self.write(&format!("{here}/REVISION"), revision);
                ok("")
            }
            ["stash"] => ok(self.stash_output.clone()),
            ["branch", .., "-r"] => {
                let mut listing = "  origin/HEAD -> origin/master\n".to_string();
                for branch in &self.remote_branches {
                    listing.push_str(&format!("  origin/{branch}\n"));
                }
                ok(listing)
            }
            ["rev-parse", "--abbrev-ref", "HEAD"] => ok(format!("{}\n", self.server_branch)),
            ["rev-parse", "HEAD"] => ok("4f1c2e9d0b\n"),
            ["status", ..] => ok(self.status.clone()),
            ["log", ..] => {
                let revision = match self.tree.get(&format!("{here}/REVISION")) {
                    Some(Node::File(content)) => content.clone(),
                    _ => "unknown".to_string(),
                };
                ok(format!("commit 4f1c2e9d0b\n\n    deploy {revision}\n"))
            }
            _ => ok(""),
        }
    }

    fn svn(&mut self, cwd: Option<&RemotePath>, args: &[&str]) -> CommandOutput {
        match args.first() {
            Some(&"checkout") => {
                let [.., source, target] = args else {
                    return failed("svn: missing arguments");
                };
                let target = absolute(cwd, target);
                let revision = source.rsplit_once('@').map_or("HEAD", |(_, r)| r);
                self.mkdir_p(&format!("{target}/.svn"));
                self.write(&format!("{target}/REVISION"), revision);
                ok("")
            }
            Some(&"update") => {
                let here = cwd.map(RemotePath::to_string).unwrap_or_default();
                if let Some(i) = args.iter().position(|a| *a == "--revision") {
                    if let Some(revision) = args.get(i + 1) {
                        self.write(&format!("{here}/REVISION"), revision);
                    }
                }
                ok("")
            }
            Some(&"status") => ok(self.status.clone()),
            _ => ok(""),
        }
    }

    fn cvs(&mut self, cwd: Option<&RemotePath>, args: &[&str]) -> CommandOutput {
        let Some(checkout) = args.iter().position(|a| *a == "checkout") else {
            return ok("");
        };
        let rest = &args[checkout + 1..];
        if let Some(i) = rest.iter().position(|a| *a == "-d") {
            if let Some(target) = rest.get(i + 1) {
                let target = absolute(cwd, target);
                self.mkdir_p(&format!("{target}/CVS"));
            }
        }
        ok("")
    }

    fn tasks(&mut self, cwd: Option<&RemotePath>, args: &[&str]) -> CommandOutput {
        let invocation = args.last().copied().unwrap_or_default();
        if let Some(file) = invocation.strip_prefix("dump_db:") {
            let file = absolute(cwd, file);
            if !self.is_dir(parent(&file)) {
                return failed(format!("cannot write {file}"));
            }
            self.write(&file, "-- dump");
        }
        ok("")
    }
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dir(self, path: &str) -> Self {
        self.state.lock().mkdir_p(path);
        self
    }

    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.state.lock().write(path, content);
        self
    }

    /// A git working copy at `path` on `revision`, with one application file.
    pub fn with_git_release(self, path: &str, revision: &str) -> Self {
        self.with_dir(&format!("{path}/.git"))
            .with_file(&format!("{path}/REVISION"), revision)
            .with_file(&format!("{path}/app.py"), &format!("# {revision}"))
    }

    /// Branch checked out on the server and the branches `git branch -r` lists.
    pub fn with_branches(self, server: &str, remote: &[&str]) -> Self {
        {
            let mut state = self.state.lock();
            state.server_branch = server.to_string();
            state.remote_branches = remote.iter().map(|b| b.to_string()).collect();
        }
        self
    }

    pub fn with_status(self, status: &str) -> Self {
        self.state.lock().status = status.to_string();
        self
    }

    pub fn with_stash_output(self, output: &str) -> Self {
        self.state.lock().stash_output = output.to_string();
        self
    }

    /// Commands whose line contains `fragment` exit with status 1.
    pub fn fail_on(self, fragment: &str) -> Self {
        self.state.lock().failures.push(fragment.to_string());
        self
    }

    /// Commands whose line contains `fragment` print `stdout` and succeed.
    pub fn respond(self, fragment: &str, stdout: &str) -> Self {
        self.state
            .lock()
            .responses
            .push((fragment.to_string(), stdout.to_string()));
        self
    }

    pub fn exists(&self, path: &str) -> bool {
        self.state.lock().exists(path)
    }

    pub fn read(&self, path: &str) -> Option<String> {
        match self.state.lock().tree.get(path) {
            Some(Node::File(content)) => Some(content.clone()),
            _ => None,
        }
    }

    pub fn children(&self, dir: &str) -> Vec<String> {
        self.state.lock().children(dir)
    }

    /// Everything under `path`, keyed relative to it.
    pub fn snapshot(&self, path: &str) -> BTreeMap<String, Node> {
        self.state
            .lock()
            .subtree(path)
            .into_iter()
            .map(|(k, v)| (k[path.len()..].to_string(), v))
            .collect()
    }

    pub fn note(&self, event: impl Into<String>) {
        self.state.lock().log.push(Recorded {
            line: event.into(),
            privileged: false,
        });
    }

    pub fn recorded(&self) -> Vec<Recorded> {
        self.state.lock().log.clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.recorded().into_iter().map(|r| r.line).collect()
    }

    pub fn clear_log(&self) {
        self.state.lock().log.clear();
    }

    /// Position of the first recorded line containing `fragment`.
    pub fn position(&self, fragment: &str) -> Option<usize> {
        self.commands().iter().position(|c| c.contains(fragment))
    }

    pub fn ran(&self, fragment: &str) -> bool {
        self.position(fragment).is_some()
    }

    fn execute(
        &self,
        command: &Command,
        privileged: bool,
        tolerance: Tolerance,
    ) -> Result<CommandOutput, DeployError> {
        let line = command.redacted();
        let mut state = self.state.lock();
        state.log.push(Recorded {
            line: line.clone(),
            privileged,
        });

        let canned = state
            .responses
            .iter()
            .find(|(fragment, _)| line.contains(fragment.as_str()))
            .map(|(_, stdout)| stdout.clone());
        let output = if state.failures.iter().any(|f| line.contains(f.as_str())) {
            failed("simulated failure")
        } else if let Some(stdout) = canned {
            ok(stdout)
        } else {
            state.interpret(command)
        };
        drop(state);
        check_output(command, output, tolerance)
    }
}

#[async_trait]
impl RemoteExecutor for FakeHost {
    async fn run(
        &self,
        command: &Command,
        tolerance: Tolerance,
    ) -> Result<CommandOutput, DeployError> {
        self.execute(command, false, tolerance)
    }

    async fn run_privileged(
        &self,
        command: &Command,
        tolerance: Tolerance,
    ) -> Result<CommandOutput, DeployError> {
        self.execute(command, true, tolerance)
    }
}

#[async_trait]
impl FileProbe for FakeHost {
    async fn exists(&self, path: &RemotePath) -> Result<bool, DeployError> {
        Ok(self.state.lock().exists(path.as_str()))
    }
}

/// Operator machine whose git checkout sits on a fixed branch.
#[derive(Debug)]
pub struct FakeLocal {
    branch: String,
    log: Mutex<Vec<String>>,
}

impl FakeLocal {
    pub fn on_branch(branch: &str) -> Self {
        Self {
            branch: branch.to_string(),
            log: Mutex::new(Vec::new()),
        }
    }

    pub fn commands(&self) -> Vec<String> {
        self.log.lock().clone()
    }
}

#[async_trait]
impl LocalExecutor for FakeLocal {
    async fn run(&self, command: &Command) -> Result<CommandOutput, DeployError> {
        self.log.lock().push(command.redacted());
        Ok(ok(format!("{}\n", self.branch)))
    }
}

/// Serving layer that writes its actions into the host's command log.
#[derive(Debug)]
pub struct RecordingServing<'a> {
    host: &'a FakeHost,
    fail_in_maintenance: bool,
    in_maintenance: AtomicBool,
}

impl<'a> RecordingServing<'a> {
    pub fn new(host: &'a FakeHost) -> Self {
        Self {
            host,
            fail_in_maintenance: false,
            in_maintenance: AtomicBool::new(false),
        }
    }

    /// Reloads exit with status 1 while the maintenance config is linked.
    pub fn with_broken_maintenance_config(mut self) -> Self {
        self.fail_in_maintenance = true;
        self
    }

    fn event(&self, name: &str) -> CommandOutput {
        self.host.note(format!("serving: {name}"));
        ok("")
    }
}

#[async_trait]
impl ServingLayerControl for RecordingServing<'_> {
    async fn start(&self, _tolerance: Tolerance) -> Result<CommandOutput, DeployError> {
        Ok(self.event("start"))
    }

    async fn stop(&self, _tolerance: Tolerance) -> Result<CommandOutput, DeployError> {
        Ok(self.event("stop"))
    }

    async fn reload(&self, tolerance: Tolerance) -> Result<CommandOutput, DeployError> {
        let output = self.event("reload");
        if self.fail_in_maintenance && self.in_maintenance.load(Ordering::SeqCst) {
            return check_output(&Command::new("reload"), failed("reload failed"), tolerance);
        }
        Ok(output)
    }

    async fn restart(&self, _tolerance: Tolerance) -> Result<CommandOutput, DeployError> {
        Ok(self.event("restart"))
    }

    async fn link_config(&self, maintenance: bool) -> Result<(), DeployError> {
        self.in_maintenance.store(maintenance, Ordering::SeqCst);
        let which = if maintenance { "maintenance" } else { "live" };
        self.event(&format!("link {which} config"));
        Ok(())
    }

    async fn config_test(&self) -> Result<(), DeployError> {
        self.event("config test");
        Ok(())
    }
}
