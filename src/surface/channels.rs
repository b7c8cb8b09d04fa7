//! Bridge between the HTTP server task and the control loop.
//!
//! HTTP handlers run on the server's own task and never touch the
//! regulator directly. They post a [`SurfaceRequest`] and wait for the
//! matching [`SurfaceReply`]; the control loop drains a bounded number
//! of requests per iteration with [`SurfaceBridge::serve_pending`].
//! Only the loop mutates the service, so `apply` and `save` always run
//! as one uninterrupted step.
//!
//! Every request carries the deadline its caller waits for. The loop
//! discards requests whose caller has already given up, so a client
//! told "timed out" never has its write applied behind its back.
//! Replies land in a mailbox keyed by request id; each waiter takes only
//! its own, so concurrent handlers cannot steal each other's answers.
//!
//! ```text
//! ┌──────────────┐ SurfaceRequest ┌──────────────┐
//! │  HTTP task   │───────────────▶│ Control loop │
//! │  (blocking)  │◀───────────────│ (owns state) │
//! └──────────────┘  SurfaceReply  └──────────────┘
//! ```
//!
//! The latest [`StatusView`] is also published behind a blocking mutex
//! so a status read never has to wait for the loop.

use core::cell::{Cell, RefCell};
use core::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use heapless::{String, Vec};
use log::warn;

use crate::app::ports::{EventSink, StoragePort};
use crate::app::service::RegulatorService;
use crate::app::status::StatusView;

use super::form::MAX_FORM_LEN;
use super::handler::{self, Method, Response};

/// Depth of the request queue.
const DEPTH: usize = 4;
/// Replies waiting to be collected.
const MAILBOX: usize = 2 * DEPTH;
const MAX_PATH_LEN: usize = 32;
/// How often a waiting handler checks for its reply.
const REPLY_POLL: Duration = Duration::from_millis(5);
/// A request is only served with at least this much of its wait left.
const SERVE_MARGIN: Duration = Duration::from_millis(20);
/// Replies are kept this long past their deadline before pruning.
const REPLY_GRACE: Duration = Duration::from_secs(1);

pub struct SurfaceRequest {
    pub id: u32,
    /// The caller stops waiting at this instant.
    pub deadline: Instant,
    pub method: Method,
    pub path: String<MAX_PATH_LEN>,
    pub body: Vec<u8, MAX_FORM_LEN>,
}

pub struct SurfaceReply {
    pub id: u32,
    pub deadline: Instant,
    pub response: Response,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeError {
    /// The request queue is full; the loop is behind.
    Busy,
    /// No reply within the caller's deadline.
    Timeout,
    /// Path or body does not fit the request buffers.
    TooLarge,
}

impl BridgeError {
    /// Transport status code for this failure.
    pub fn status(self) -> u16 {
        match self {
            Self::Busy => 503,
            Self::Timeout => 504,
            Self::TooLarge => 413,
        }
    }
}

pub struct SurfaceBridge {
    requests: Channel<CriticalSectionRawMutex, SurfaceRequest, DEPTH>,
    replies: Mutex<CriticalSectionRawMutex, RefCell<Vec<SurfaceReply, MAILBOX>>>,
    next_id: AtomicU32,
    status: Mutex<CriticalSectionRawMutex, Cell<Option<StatusView>>>,
}

impl Default for SurfaceBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl SurfaceBridge {
    /// Usable in a `static`.
    pub const fn new() -> Self {
        Self {
            requests: Channel::new(),
            replies: Mutex::new(RefCell::new(Vec::new())),
            next_id: AtomicU32::new(1),
            status: Mutex::new(Cell::new(None)),
        }
    }

    // ── HTTP task side ────────────────────────────────────────

    /// Post a request and block until its reply arrives or `timeout`
    /// passes. A request that times out is never applied.
    pub fn submit(
        &self,
        method: Method,
        path: &str,
        body: &[u8],
        timeout: Duration,
    ) -> Result<Response, BridgeError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let deadline = Instant::now() + timeout;
        let request = SurfaceRequest {
            id,
            deadline,
            method,
            path: String::try_from(path).map_err(|_| BridgeError::TooLarge)?,
            body: Vec::from_slice(body).map_err(|_| BridgeError::TooLarge)?,
        };
        self.requests
            .try_send(request)
            .map_err(|_| BridgeError::Busy)?;

        loop {
            if let Some(response) = self.take_reply(id) {
                return Ok(response);
            }
            if Instant::now() >= deadline {
                return Err(BridgeError::Timeout);
            }
            std::thread::sleep(REPLY_POLL);
        }
    }

    fn take_reply(&self, id: u32) -> Option<Response> {
        self.replies.lock(|mailbox| {
            let mut mailbox = mailbox.borrow_mut();
            let at = mailbox.iter().position(|r| r.id == id)?;
            Some(mailbox.swap_remove(at).response)
        })
    }

    /// Requests queued and not yet taken by the loop.
    pub fn pending(&self) -> usize {
        self.requests.len()
    }

    /// The status last published by the loop, if any.
    pub fn latest_status(&self) -> Option<StatusView> {
        self.status.lock(Cell::get)
    }

    // ── Control loop side ─────────────────────────────────────

    /// Take up to `budget` queued requests and answer the ones whose
    /// caller is still waiting. Returns how many were answered.
    pub fn serve_pending<S: StoragePort>(
        &self,
        service: &mut RegulatorService<S>,
        sink: &mut impl EventSink,
        budget: usize,
    ) -> usize {
        let mut served = 0;
        for _ in 0..budget {
            let Ok(request) = self.requests.try_receive() else {
                break;
            };
            if request.deadline.saturating_duration_since(Instant::now()) < SERVE_MARGIN {
                warn!("Surface: request #{} expired before service, discarded", request.id);
                continue;
            }
            let response = handler::route(service, request.method, &request.path, &request.body, sink);
            self.post_reply(SurfaceReply {
                id: request.id,
                deadline: request.deadline,
                response,
            });
            served += 1;
        }
        if served > 0 {
            self.publish_status(service.status());
        }
        served
    }

    fn post_reply(&self, reply: SurfaceReply) {
        self.replies.lock(|mailbox| {
            let mut mailbox = mailbox.borrow_mut();
            // Nobody is waiting for these any more.
            let now = Instant::now();
            mailbox.retain(|r| r.deadline + REPLY_GRACE > now);
            if let Err(reply) = mailbox.push(reply) {
                warn!("Surface: reply mailbox full, dropping reply #{}", reply.id);
            }
        });
    }

    /// Make `view` visible to status readers.
    pub fn publish_status(&self, view: StatusView) {
        self.status.lock(|cell| cell.set(Some(view)));
    }
}
