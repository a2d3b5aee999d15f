//! Test transports.

use async_trait::async_trait;
use lectern_cache::{GraphError, GraphRequest, GraphResponse, Transport, TransportError};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use tokio::sync::oneshot;

type Reply = Result<GraphResponse, TransportError>;

/// Answers from per-operation queues of canned replies.
///
/// The last reply for an operation is repeated once its queue drains to one.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: RefCell<HashMap<String, VecDeque<Reply>>>,
    requests: RefCell<Vec<GraphRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a data reply for the named operation.
    pub fn respond(self, operation: &str, data: serde_json::Value) -> Self {
        self.reply(operation, Ok(GraphResponse::data(data)))
    }

    /// Queue a reply with server errors and optional partial data.
    pub fn respond_errors(self, operation: &str, data: Option<serde_json::Value>, messages: &[&str]) -> Self {
        let errors = messages.iter().map(|m| GraphError::new(*m)).collect();
        self.reply(operation, Ok(GraphResponse { data, errors }))
    }

    /// Queue a transport failure.
    pub fn fail(self, operation: &str, error: TransportError) -> Self {
        self.reply(operation, Err(error))
    }

    pub fn reply(self, operation: &str, reply: Reply) -> Self {
        self.replies
            .borrow_mut()
            .entry(operation.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    /// Requests seen so far, in order.
    pub fn requests(&self) -> Vec<GraphRequest> {
        self.requests.borrow().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }
}

#[async_trait(?Send)]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: &GraphRequest) -> Reply {
        self.requests.borrow_mut().push(request.clone());
        let name = request.operation_name.clone().unwrap_or_default();

        let mut replies = self.replies.borrow_mut();
        let Some(queue) = replies.get_mut(&name) else {
            return Err(TransportError::request(format!("no reply scripted for {name:?}")));
        };
        match queue.len() {
            0 => Err(TransportError::request(format!("no reply scripted for {name:?}"))),
            1 => queue.front().cloned().unwrap_or_else(|| Err(TransportError::request("empty"))),
            _ => queue.pop_front().unwrap_or_else(|| Err(TransportError::request("empty"))),
        }
    }
}

/// Holds every request until the test releases it, so tests decide the
/// order in which responses arrive.
#[derive(Default)]
pub struct GatedTransport {
    requests: RefCell<Vec<GraphRequest>>,
    gates: RefCell<Vec<Option<oneshot::Sender<Reply>>>>,
}

impl GatedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of requests received so far.
    pub fn received(&self) -> usize {
        self.requests.borrow().len()
    }

    pub fn request(&self, index: usize) -> Option<GraphRequest> {
        self.requests.borrow().get(index).cloned()
    }

    /// Yield to other local tasks until `count` requests are waiting.
    pub async fn wait_for(&self, count: usize) {
        while self.received() < count {
            tokio::task::yield_now().await;
        }
    }

    /// Let request `index` complete with `data`. Returns false if it was
    /// already released or never sent.
    pub fn release(&self, index: usize, data: serde_json::Value) -> bool {
        self.release_with(index, Ok(GraphResponse::data(data)))
    }

    pub fn release_with(&self, index: usize, reply: Reply) -> bool {
        let gate = self.gates.borrow_mut().get_mut(index).and_then(Option::take);
        match gate {
            Some(sender) => sender.send(reply).is_ok(),
            None => false,
        }
    }
}

#[async_trait(?Send)]
impl Transport for GatedTransport {
    async fn execute(&self, request: &GraphRequest) -> Reply {
        let (sender, receiver) = oneshot::channel();
        self.gates.borrow_mut().push(Some(sender));
        self.requests.borrow_mut().push(request.clone());

        receiver
            .await
            .unwrap_or_else(|_| Err(TransportError::request("gate closed before release")))
    }
}
