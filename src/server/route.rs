//! Request routing.
//!
//! Routing never fails: every outcome, including a panic while resolving
//! an item, is a `Reply`.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tiny_http::Method;

use super::{RequestContext, listing, path};
use crate::source::ContentStream;
use crate::utils::mime;

/// What to send back for one request.
pub enum Reply {
    Listing(String),
    Content {
        mime: &'static str,
        stream: ContentStream,
    },
    NotFound(String),
    Failed(String),
    MethodNotAllowed,
}

impl Reply {
    pub fn status(&self) -> u16 {
        match self {
            Self::Listing(_) | Self::Content { .. } => 200,
            Self::NotFound(_) => 404,
            Self::Failed(_) => 500,
            Self::MethodNotAllowed => 405,
        }
    }
}

/// Route a request, converting a panic into a 500.
pub fn route(method: &Method, url: &str, ctx: &RequestContext) -> Reply {
    panic::catch_unwind(AssertUnwindSafe(|| resolve(method, url, ctx)))
        .unwrap_or_else(|payload| Reply::Failed(panic_message(payload.as_ref())))
}

fn resolve(method: &Method, url: &str, ctx: &RequestContext) -> Reply {
    if !matches!(method, Method::Get | Method::Head) {
        return Reply::MethodNotAllowed;
    }

    let name = path::normalize_url(url);
    if name.is_empty() {
        return Reply::Listing(listing::render(&ctx.registry, ctx.addr));
    }

    // The snapshot behind the lookup is released before the body streams.
    let Some(item) = ctx.registry.lookup_by_name(&name) else {
        return Reply::NotFound(name);
    };

    match ctx.source.open(&item.handle) {
        Ok(Some(stream)) => Reply::Content {
            mime: mime::guess(&item.name),
            stream,
        },
        Ok(None) => Reply::Failed(format!("could not open {}", item.name)),
        Err(e) => Reply::Failed(e.to_string()),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "internal error".to_string()
    }
}
