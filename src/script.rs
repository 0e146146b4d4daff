//! Script ingestion.
//!
//! The loader publishes a parameter mapping as read-only ambient state, then hands
//! each script to a [`ScriptEvaluator`] in order. Evaluation itself is up to the
//! embedder; this module only sequences it and attributes failures to files.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Parameter mapping published to scripts.
pub type Parameters = serde_json::Map<String, serde_json::Value>;

/// One script source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    /// Name the script is reported under.
    pub filename: String,
    /// Source text.
    pub source: String,
}

impl Script {
    /// Creates a script.
    pub fn new(filename: impl Into<String>, source: impl Into<String>) -> Self {
        Script {
            filename: filename.into(),
            source: source.into(),
        }
    }
}

/// Evaluates script sources in a shared environment.
pub trait ScriptEvaluator {
    /// Evaluates one script. `parameters` is the published mapping.
    ///
    /// # Errors
    ///
    /// Returns whatever failure the evaluation produced.
    fn evaluate(&mut self, script: &Script, parameters: &Parameters) -> Result<()>;
}

impl<F> ScriptEvaluator for F
where
    F: FnMut(&Script, &Parameters) -> Result<()>,
{
    fn evaluate(&mut self, script: &Script, parameters: &Parameters) -> Result<()> {
        self(script, parameters)
    }
}

/// One-shot script loader.
#[derive(Debug, Default)]
pub struct ScriptLoader {
    parameters: OnceLock<Parameters>,
}

impl ScriptLoader {
    /// Creates a loader with no published parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes `parameters`, then evaluates `scripts` in order.
    ///
    /// Evaluation stops at the first failing script. Parameters stay published even
    /// if evaluation fails.
    ///
    /// # Errors
    ///
    /// - [`Error::ParametersFrozen`] if parameters were already published
    /// - [`Error::ScriptLoad`] naming the first script that failed
    pub fn load(
        &self,
        scripts: &[Script],
        parameters: Parameters,
        evaluator: &mut dyn ScriptEvaluator,
    ) -> Result<()> {
        self.parameters
            .set(parameters)
            .map_err(|_| Error::ParametersFrozen)?;
        let parameters = self.parameters();

        for script in scripts {
            tracing::debug!(filename = %script.filename, "evaluating script");
            evaluator
                .evaluate(script, parameters)
                .map_err(|e| Error::ScriptLoad {
                    filename: script.filename.clone(),
                    message: e.to_string(),
                })?;
        }
        Ok(())
    }

    /// Returns the published parameters, empty before the first load.
    #[must_use]
    pub fn parameters(&self) -> &Parameters {
        static EMPTY: OnceLock<Parameters> = OnceLock::new();
        self.parameters
            .get()
            .unwrap_or_else(|| EMPTY.get_or_init(Parameters::new))
    }

    /// Returns `true` once parameters were published.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.parameters.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_load_in_order() {
        let loader = ScriptLoader::new();
        assert!(loader.parameters().is_empty());

        let mut seen = Vec::new();
        let mut evaluator = |script: &Script, parameters: &Parameters| -> Result<()> {
            assert_eq!(parameters.get("pkg"), Some(&json!("com.example")));
            seen.push(script.filename.clone());
            Ok(())
        };
        let params = json!({"pkg": "com.example"}).as_object().cloned().unwrap();
        loader
            .load(
                &[Script::new("a.js", "1"), Script::new("b.js", "2")],
                params,
                &mut evaluator,
            )
            .unwrap();

        assert_eq!(seen, vec!["a.js", "b.js"]);
        assert!(loader.is_loaded());
    }

    #[test]
    fn test_first_failure_names_file() {
        let loader = ScriptLoader::new();
        let mut calls = 0;
        let mut evaluator = |script: &Script, _: &Parameters| -> Result<()> {
            calls += 1;
            if script.filename == "bad.js" {
                Err(runtime_error!("SyntaxError"))
            } else {
                Ok(())
            }
        };
        let err = loader
            .load(
                &[
                    Script::new("ok.js", ""),
                    Script::new("bad.js", ""),
                    Script::new("never.js", ""),
                ],
                Parameters::new(),
                &mut evaluator,
            )
            .unwrap_err();

        match err {
            Error::ScriptLoad { filename, message } => {
                assert_eq!(filename, "bad.js");
                assert!(message.contains("SyntaxError"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_parameters_frozen() {
        let loader = ScriptLoader::new();
        let mut evaluator = |_: &Script, _: &Parameters| -> Result<()> { Ok(()) };
        loader.load(&[], Parameters::new(), &mut evaluator).unwrap();
        assert!(matches!(
            loader.load(&[], Parameters::new(), &mut evaluator),
            Err(Error::ParametersFrozen)
        ));
    }
}
