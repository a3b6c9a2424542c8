use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::ProviderError;
use crate::providers::{ChatProvider, ChatRequest};

pub(crate) const LONG_ANALYSIS: &str = "A sturdy oak dining chair with a spindle back, \
light scratches on the seat, classic farmhouse style and solid joinery throughout.";

pub(crate) const FORMATTED_RECOMMENDATIONS: &str = "### DIY Creative Ideas
1. Paint it sage green
2. Add a seat cushion
### Monetization Opportunities
1. Sell it refinished
### Sustainability Benefits
1. Keeps oak out of landfill
### Helpful Tutorials
1. Stripping old varnish
### Marketplace Suggestions
1. Etsy
";

#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Text(String),
    Quota,
    Failure(u16),
}

impl Reply {
    pub(crate) fn text(value: &str) -> Self {
        Reply::Text(value.to_string())
    }

    fn into_result(self, provider: &str) -> Result<String, ProviderError> {
        match self {
            Reply::Text(text) => Ok(text),
            Reply::Quota => Err(ProviderError::QuotaExceeded {
                provider: provider.to_string(),
                message: "insufficient_quota".to_string(),
            }),
            Reply::Failure(status) => Err(ProviderError::Http {
                provider: provider.to_string(),
                status,
                body: "scripted failure".to_string(),
            }),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct CallLog {
    vision: AtomicUsize,
    text: AtomicUsize,
}

impl CallLog {
    pub(crate) fn vision_calls(&self) -> usize {
        self.vision.load(Ordering::SeqCst)
    }

    pub(crate) fn text_calls(&self) -> usize {
        self.text.load(Ordering::SeqCst)
    }
}

/// Provider answering from per-kind reply queues, then from a default reply.
pub(crate) struct ScriptedProvider {
    name: String,
    needs_key: bool,
    vision: Mutex<VecDeque<Reply>>,
    vision_default: Reply,
    text: Mutex<VecDeque<Reply>>,
    text_default: Reply,
    log: Arc<CallLog>,
}

impl ScriptedProvider {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            needs_key: true,
            vision: Mutex::new(VecDeque::new()),
            vision_default: Reply::text(LONG_ANALYSIS),
            text: Mutex::new(VecDeque::new()),
            text_default: Reply::text(FORMATTED_RECOMMENDATIONS),
            log: Arc::new(CallLog::default()),
        }
    }

    pub(crate) fn vision_replies(self, replies: impl IntoIterator<Item = Reply>) -> Self {
        self.vision.lock().unwrap().extend(replies);
        self
    }

    pub(crate) fn vision_default(mut self, reply: Reply) -> Self {
        self.vision_default = reply;
        self
    }

    pub(crate) fn text_default(mut self, reply: Reply) -> Self {
        self.text_default = reply;
        self
    }

    pub(crate) fn keyless(mut self) -> Self {
        self.needs_key = false;
        self
    }

    pub(crate) fn log(&self) -> Arc<CallLog> {
        Arc::clone(&self.log)
    }
}

impl ChatProvider for ScriptedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn requires_credential(&self) -> bool {
        self.needs_key
    }

    fn complete(
        &self,
        _api_key: Option<&str>,
        request: &ChatRequest,
    ) -> Result<String, ProviderError> {
        let (queue, fallback, counter) = if request.image.is_some() {
            (&self.vision, &self.vision_default, &self.log.vision)
        } else {
            (&self.text, &self.text_default, &self.log.text)
        };
        counter.fetch_add(1, Ordering::SeqCst);
        let reply = queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| fallback.clone());
        reply.into_result(&self.name)
    }
}
