//! In-memory tab answering tagged scripts by name.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use browse_relay::{CdpError, PageHandle};
use parking_lot::Mutex;
use serde_json::Value;

const TAG: &str = "//# sourceURL=browse/";

#[derive(Clone)]
enum Reply {
    Value(Value),
    Throw(String),
    Timeout(String),
}

#[derive(Clone)]
pub enum NavFailure {
    Timeout,
    Failed(String),
}

pub struct MockPage {
    url: Mutex<String>,
    title: String,
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    selectors: HashSet<String>,
    nav_failure: Option<NavFailure>,
    screenshot: Option<String>,
    navigations: Mutex<Vec<String>>,
    evaluations: Mutex<Vec<(String, String)>>,
}

impl MockPage {
    pub fn new(url: &str, title: &str) -> Self {
        Self {
            url: Mutex::new(url.to_string()),
            title: title.to_string(),
            replies: Mutex::new(HashMap::new()),
            selectors: HashSet::new(),
            nav_failure: None,
            screenshot: None,
            navigations: Mutex::new(Vec::new()),
            evaluations: Mutex::new(Vec::new()),
        }
    }

    /// Queue a result for the named script. The last queued result repeats.
    pub fn script(self, name: &str, value: Value) -> Self {
        self.push(name, Reply::Value(value))
    }

    /// Queue several results for the named script, in order.
    pub fn script_seq(mut self, name: &str, values: impl IntoIterator<Item = Value>) -> Self {
        for value in values {
            self = self.push(name, Reply::Value(value));
        }
        self
    }

    pub fn script_throws(self, name: &str, message: &str) -> Self {
        self.push(name, Reply::Throw(message.to_string()))
    }

    /// Make the named script hit the CDP call timeout.
    pub fn script_timeout(self, name: &str, message: &str) -> Self {
        self.push(name, Reply::Timeout(message.to_string()))
    }

    fn push(self, name: &str, reply: Reply) -> Self {
        self.replies
            .lock()
            .entry(name.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    /// Make `selector` resolve in `wait_for_selector`.
    pub fn selector(mut self, selector: &str) -> Self {
        self.selectors.insert(selector.to_string());
        self
    }

    pub fn failing_navigation(mut self, failure: NavFailure) -> Self {
        self.nav_failure = Some(failure);
        self
    }

    pub fn screenshot_data(mut self, data: String) -> Self {
        self.screenshot = Some(data);
        self
    }

    pub fn navigations(&self) -> Vec<String> {
        self.navigations.lock().clone()
    }

    /// How many times the named script ran.
    pub fn calls(&self, name: &str) -> usize {
        self.evaluations
            .lock()
            .iter()
            .filter(|(n, _)| n == name)
            .count()
    }

    /// Full expression of the most recent run of the named script.
    pub fn last_expression(&self, name: &str) -> Option<String> {
        self.evaluations
            .lock()
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, e)| e.clone())
    }

    fn next_reply(&self, name: &str) -> Option<Reply> {
        let mut replies = self.replies.lock();
        let queue = replies.get_mut(name)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

fn script_name(expression: &str) -> Option<&str> {
    let start = expression.rfind(TAG)? + TAG.len();
    let rest = &expression[start..];
    rest.strip_suffix(".js").or_else(|| rest.split(".js").next())
}

#[async_trait]
impl PageHandle for MockPage {
    fn target_id(&self) -> &str {
        "MOCK"
    }

    async fn url(&self) -> Result<String, CdpError> {
        Ok(self.url.lock().clone())
    }

    async fn title(&self) -> Result<String, CdpError> {
        Ok(self.title.clone())
    }

    async fn evaluate(&self, expression: &str) -> Result<Value, CdpError> {
        let name = script_name(expression)
            .ok_or_else(|| CdpError::JavaScript("untagged expression".to_string()))?
            .to_string();
        self.evaluations
            .lock()
            .push((name.clone(), expression.to_string()));

        match self.next_reply(&name) {
            Some(Reply::Value(value)) => Ok(value),
            Some(Reply::Throw(message)) => Err(CdpError::JavaScript(message)),
            Some(Reply::Timeout(message)) => Err(CdpError::Timeout(message)),
            None => Err(CdpError::JavaScript(format!("no reply for script {}", name))),
        }
    }

    async fn navigate(&self, url: &str, _timeout: Duration) -> Result<(), CdpError> {
        self.navigations.lock().push(url.to_string());
        match &self.nav_failure {
            Some(NavFailure::Timeout) => Err(CdpError::Timeout("load".to_string())),
            Some(NavFailure::Failed(msg)) => Err(CdpError::NavigationFailed(msg.clone())),
            None => {
                *self.url.lock() = url.to_string();
                Ok(())
            }
        }
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        _timeout: Duration,
    ) -> Result<bool, CdpError> {
        Ok(self.selectors.contains(selector))
    }

    async fn screenshot(&self, _full_page: bool) -> Result<String, CdpError> {
        self.screenshot
            .clone()
            .ok_or_else(|| CdpError::Protocol {
                code: -32000,
                message: "Unable to capture screenshot".to_string(),
            })
    }
}
