use tokio::sync::mpsc;

/// Receives decoded controller output and engine notices for display
pub trait OutputSink {
    fn on_text(&self, text: &str);
}

impl<F> OutputSink for F
where
    F: Fn(&str),
{
    fn on_text(&self, text: &str) {
        self(text)
    }
}

impl OutputSink for mpsc::UnboundedSender<String> {
    fn on_text(&self, text: &str) {
        // Receiver gone means nobody is watching any more
        let _ = self.send(text.to_string());
    }
}
