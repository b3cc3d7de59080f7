use std::borrow::Cow;

use opentelemetry::trace::{SpanContext, SpanKind, TraceContextExt, Tracer as _};
use opentelemetry::{Context, ContextGuard, KeyValue};
use opentelemetry_sdk::trace::Tracer;

/// A span that is the active span of the current thread while this guard lives.
///
/// The span is ended exactly once: either by [`ActiveSpan::end`] or, on any
/// other exit path, when the guard is dropped. Activation is released after the
/// span has ended. The guard is `!Send`; never hold it across an `.await`.
pub struct ActiveSpan {
    cx: Context,
    _attached: ContextGuard,
}

impl ActiveSpan {
    pub fn start(tracer: &Tracer, name: impl Into<Cow<'static, str>>, kind: SpanKind) -> Self {
        let span = tracer.span_builder(name).with_kind(kind).start(tracer);
        let cx = Context::current_with_span(span);
        let attached = cx.clone().attach();
        Self {
            cx,
            _attached: attached,
        }
    }

    pub fn set_attribute(&self, attribute: KeyValue) {
        self.cx.span().set_attribute(attribute);
    }

    pub fn span_context(&self) -> SpanContext {
        self.cx.span().span_context().clone()
    }

    /// End the span now and release activation.
    pub fn end(self) {
        self.cx.span().end();
    }
}

impl Drop for ActiveSpan {
    fn drop(&mut self) {
        // Ending an already ended span is a no-op.
        self.cx.span().end();
    }
}
