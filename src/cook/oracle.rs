//! Symbol resolution by asking an interactive tool (by default `ghci`).
//!
//! One query is outstanding at a time: write a line, then collect stdout
//! until the prompt reappears. A reader thread owns the child's stdout and
//! forwards chunks over a channel so every wait is bounded by the configured
//! timeout. A timed-out child is killed and the oracle stays dead.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::io::{self, Read, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, warn};

use crate::morphism::is_operator;
use crate::types::{TypeExpr, parse_declaration};

use super::resolver::{Symbol, SymbolResolver};

#[derive(Debug, Clone)]
pub struct OracleConfig {
    pub program: String,
    pub args: Vec<String>,
    /// Lines sent once at start-up; each is answered by a prompt.
    pub setup: Vec<String>,
    pub prompt: String,
    /// Query for values and functions, `{name}` replaced by the symbol.
    pub query_template: String,
    /// Query for capitalized names, which may be types.
    pub kind_template: String,
    pub timeout: Duration,
}

impl Default for OracleConfig {
    fn default() -> Self {
        OracleConfig {
            program: "ghci".to_string(),
            args: vec!["-v0".to_string(), "-ignore-dot-ghci".to_string()],
            setup: vec![":set prompt \"<morphc>\\n\"".to_string()],
            prompt: "<morphc>".to_string(),
            query_template: ":type {name}".to_string(),
            kind_template: ":kind {name}".to_string(),
            timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("failed to start `{program}`: {source}")]
    Spawn { program: String, source: io::Error },
    #[error("oracle i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("no answer to `{query}` within {timeout:?}")]
    Timeout { query: String, timeout: Duration },
    #[error("oracle process is gone")]
    Closed,
}

struct Session {
    child: Child,
    stdin: ChildStdin,
    output: Receiver<Vec<u8>>,
    pending: Vec<u8>,
}

impl Session {
    fn start(config: &OracleConfig) -> Result<Self, OracleError> {
        let mut child = Command::new(&config.program)
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| OracleError::Spawn {
                program: config.program.clone(),
                source,
            })?;
        let stdin = child.stdin.take().ok_or(OracleError::Closed)?;
        let mut stdout = child.stdout.take().ok_or(OracleError::Closed)?;

        let (sender, output) = mpsc::channel();
        thread::spawn(move || {
            let mut buffer = [0u8; 4096];
            loop {
                match stdout.read(&mut buffer) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        if sender.send(buffer[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                }
            }
        });

        Ok(Session {
            child,
            stdin,
            output,
            pending: Vec::new(),
        })
    }

    fn send(&mut self, line: &str) -> Result<(), OracleError> {
        writeln!(self.stdin, "{line}")?;
        self.stdin.flush()?;
        Ok(())
    }

    /// Everything printed before the next prompt.
    fn until_prompt(
        &mut self,
        prompt: &str,
        timeout: Duration,
        query: &str,
    ) -> Result<String, OracleError> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(answer) = take_answer(&mut self.pending, prompt.as_bytes()) {
                return Ok(answer);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.output.recv_timeout(remaining) {
                Ok(chunk) => self.pending.extend_from_slice(&chunk),
                Err(RecvTimeoutError::Timeout) => {
                    return Err(OracleError::Timeout {
                        query: query.to_string(),
                        timeout,
                    });
                }
                Err(RecvTimeoutError::Disconnected) => return Err(OracleError::Closed),
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

pub struct Oracle {
    config: OracleConfig,
    session: RefCell<Option<Session>>,
    dead: Cell<bool>,
    cache: RefCell<HashMap<String, Option<Symbol>>>,
}

impl Oracle {
    /// Start the tool and wait for its first prompt.
    pub fn start(config: OracleConfig) -> Result<Self, OracleError> {
        let mut session = Session::start(&config)?;
        if config.setup.is_empty() {
            session.until_prompt(&config.prompt, config.timeout, "<start-up>")?;
        }
        for line in &config.setup {
            session.send(line)?;
            session.until_prompt(&config.prompt, config.timeout, line)?;
        }
        debug!(program = config.program.as_str(), "oracle ready");
        Ok(Oracle {
            config,
            session: RefCell::new(Some(session)),
            dead: Cell::new(false),
            cache: RefCell::new(HashMap::new()),
        })
    }

    pub fn is_alive(&self) -> bool {
        !self.dead.get()
    }

    /// Ask for `name`. `Ok(None)` when the tool does not know it.
    ///
    /// Capitalized names are asked for their kind first, so type
    /// constructors resolve as types; data constructors fall through to the
    /// value query.
    pub fn query(&self, name: &str) -> Result<Option<Symbol>, OracleError> {
        if let Some(cached) = self.cache.borrow().get(name) {
            return Ok(cached.clone());
        }

        let mut symbol = None;
        if name.starts_with(|c: char| c.is_uppercase()) {
            let answer = self.ask(&self.config.kind_template.replace("{name}", name))?;
            symbol = interpret_kind(name, &answer);
        }
        if symbol.is_none() {
            let subject = if is_operator(name) {
                format!("({name})")
            } else {
                name.to_string()
            };
            let answer = self.ask(&self.config.query_template.replace("{name}", &subject))?;
            symbol = interpret_type(name, &answer);
        }

        debug!(name, found = symbol.is_some(), "oracle answer");
        self.cache
            .borrow_mut()
            .insert(name.to_string(), symbol.clone());
        Ok(symbol)
    }

    fn ask(&self, line: &str) -> Result<String, OracleError> {
        if self.dead.get() {
            return Err(OracleError::Closed);
        }
        let mut session = self.session.borrow_mut();
        let Some(active) = session.as_mut() else {
            return Err(OracleError::Closed);
        };
        let answer = active
            .send(line)
            .and_then(|_| active.until_prompt(&self.config.prompt, self.config.timeout, line));
        if let Err(err) = &answer {
            warn!(%err, query = line, "oracle failed, stopping it");
            *session = None;
            self.dead.set(true);
        }
        answer
    }
}

/// Cut everything before `prompt` out of `pending`. Decoding waits for the
/// prompt so characters split across reads stay whole.
fn take_answer(pending: &mut Vec<u8>, prompt: &[u8]) -> Option<String> {
    let at = if prompt.is_empty() {
        0
    } else {
        pending.windows(prompt.len()).position(|window| window == prompt)?
    };
    let answer = String::from_utf8_lossy(&pending[..at]).into_owned();
    pending.drain(..at + prompt.len());
    Some(answer)
}

fn normalize(answer: &str) -> String {
    answer.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `Name :: kind` marks a type constructor.
fn interpret_kind(name: &str, answer: &str) -> Option<Symbol> {
    let answer = normalize(answer);
    let (declared, _) = answer.split_once("::")?;
    if declared.trim() != name {
        return None;
    }
    let con = TypeExpr::Con {
        name: name.to_string(),
        args: Vec::new(),
    };
    Some(Symbol::ty(con.structural()))
}

/// `name :: type` for functions and values.
fn interpret_type(name: &str, answer: &str) -> Option<Symbol> {
    let (declared, expr) = parse_declaration(&normalize(answer)).ok()?;
    (declared == name).then(|| Symbol::declared(expr.structural()))
}

impl SymbolResolver for Oracle {
    fn find_symbol(&self, name: &str) -> Option<Symbol> {
        match self.query(name) {
            Ok(symbol) => symbol,
            Err(err) => {
                warn!(%err, name, "oracle lookup failed");
                None
            }
        }
    }
}
