use std::collections::HashMap;

use super::value::{CapturedEnv, RValue};

type ScopeFrame = HashMap<String, RValue>;

/// Variables of one function call; a frame per nested block.
#[derive(Debug, Default)]
pub struct Scope {
    frames: Vec<ScopeFrame>,
}

impl Scope {
    pub fn new() -> Self {
        Self {
            frames: vec![HashMap::new()],
        }
    }

    /// Starts from a closure's captured variables.
    pub fn with_env(env: &CapturedEnv) -> Self {
        Self {
            frames: vec![env.0.clone()],
        }
    }

    pub fn enter(&mut self) {
        self.frames.push(HashMap::new());
    }

    pub fn leave(&mut self) {
        self.frames.pop();
    }

    /// Innermost binding of `name`.
    pub fn resolve(&self, name: &str) -> Option<&RValue> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }

    /// Binds in the innermost frame.
    pub fn add(&mut self, name: impl Into<String>, value: RValue) {
        if self.frames.is_empty() {
            self.frames.push(HashMap::new());
        }
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name.into(), value);
        }
    }

    /// Every visible binding, inner frames shadowing outer ones.
    pub fn capture(&self) -> CapturedEnv {
        let mut env = HashMap::new();
        for frame in &self.frames {
            env.extend(frame.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        CapturedEnv(env)
    }
}
