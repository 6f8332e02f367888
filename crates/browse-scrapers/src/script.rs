//! Tagged in-page scripts.
//!
//! Each script is a JavaScript function expression invoked with a single JSON
//! argument. The expression carries a `//# sourceURL=browse/<name>.js` tag so
//! it shows up by name in DevTools and can be matched by test pages.

use browse_relay::{CdpError, PageHandle};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ScrapeError;

/// Tag prefix appended to every evaluated expression.
pub(crate) const SOURCE_URL_PREFIX: &str = "//# sourceURL=browse/";

#[derive(Debug, Clone, Copy)]
pub(crate) struct Script {
    name: &'static str,
    body: &'static str,
}

impl Script {
    pub(crate) const fn new(name: &'static str, body: &'static str) -> Self {
        Self { name, body }
    }

    pub(crate) fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn expression(&self, args: &Value) -> String {
        format!("({})({})\n{}", self.body, args, tag(self.name))
    }

    /// Evaluate and return the raw JSON value.
    pub(crate) async fn eval(
        &self,
        page: &dyn PageHandle,
        args: Value,
    ) -> Result<Value, ScrapeError> {
        page.evaluate(&self.expression(&args))
            .await
            .map_err(|e| match e {
                CdpError::JavaScript(msg) => {
                    ScrapeError::ExtractionFailed(format!("{}: {}", self.name, msg))
                }
                other => other.into(),
            })
    }

    /// Evaluate and decode the result. A shape mismatch means the page
    /// markup is not what the script expected.
    pub(crate) async fn call<T: DeserializeOwned>(
        &self,
        page: &dyn PageHandle,
        args: Value,
    ) -> Result<T, ScrapeError> {
        let value = self.eval(page, args).await?;
        serde_json::from_value(value).map_err(|e| {
            ScrapeError::ExtractionFailed(format!("{}: unexpected result: {}", self.name, e))
        })
    }
}

pub(crate) fn tag(name: &str) -> String {
    format!("{}{}.js", SOURCE_URL_PREFIX, name)
}
