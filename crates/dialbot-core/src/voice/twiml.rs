//! Voice-markup (TwiML) scripts.
//!
//! A [`VoiceScript`] is built fresh for each webhook response, serialized once
//! and discarded. Scripts never loop: the answer stage issues exactly one
//! single-digit gather and every path after it terminates the call, so a leg
//! can never outlive the gather timeout plus speech time.

/// A single instruction in a voice-markup script.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verb {
    /// Speak the given text.
    Say(String),
    /// Silence for the given number of seconds.
    Pause { seconds: u32 },
    /// Collect keypad digits. `action` is the absolute callback URL the
    /// provider posts the digits to; `prompt` is spoken while gathering.
    Gather {
        num_digits: u32,
        action: String,
        prompt: String,
    },
    /// Terminate the call leg.
    Hangup,
}

/// Ordered voice instructions, serialized to the provider's XML markup.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VoiceScript {
    verbs: Vec<Verb>,
}

impl VoiceScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn say(mut self, text: impl Into<String>) -> Self {
        self.verbs.push(Verb::Say(text.into()));
        self
    }

    pub fn pause(mut self, seconds: u32) -> Self {
        self.verbs.push(Verb::Pause { seconds });
        self
    }

    pub fn gather(mut self, num_digits: u32, action: impl Into<String>, prompt: impl Into<String>) -> Self {
        self.verbs.push(Verb::Gather {
            num_digits,
            action: action.into(),
            prompt: prompt.into(),
        });
        self
    }

    pub fn hangup(mut self) -> Self {
        self.verbs.push(Verb::Hangup);
        self
    }

    pub fn verbs(&self) -> &[Verb] {
        &self.verbs
    }

    /// True if any instruction gathers digits or hands control elsewhere.
    pub fn collects_input(&self) -> bool {
        self.verbs.iter().any(|v| matches!(v, Verb::Gather { .. }))
    }

    /// Serialize to the provider's XML markup.
    pub fn to_xml(&self) -> String {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response>");
        for verb in &self.verbs {
            match verb {
                Verb::Say(text) => {
                    out.push_str("<Say>");
                    out.push_str(&escape_xml(text));
                    out.push_str("</Say>");
                }
                Verb::Pause { seconds } => {
                    out.push_str(&format!("<Pause length=\"{seconds}\"/>"));
                }
                Verb::Gather {
                    num_digits,
                    action,
                    prompt,
                } => {
                    out.push_str(&format!(
                        "<Gather numDigits=\"{num_digits}\" action=\"{}\" method=\"POST\">",
                        escape_xml(action)
                    ));
                    out.push_str("<Say>");
                    out.push_str(&escape_xml(prompt));
                    out.push_str("</Say></Gather>");
                }
                Verb::Hangup => out.push_str("<Hangup/>"),
            }
        }
        out.push_str("</Response>");
        out
    }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

/// Script returned when the callee answers: greet, then gather exactly one
/// digit, posting it to `capture_url`. If nothing is pressed before the
/// provider's gather timeout, say goodbye and let the script end.
pub fn answer_script(capture_url: &str) -> VoiceScript {
    VoiceScript::new()
        .pause(1)
        .say("Hello! This is an automated call from your Telegram bot.")
        .gather(1, capture_url, "Press any key to continue.")
        .say("We did not receive any input. Goodbye.")
}

/// Script returned after digits were captured: acknowledge and end the leg.
pub fn capture_script() -> VoiceScript {
    VoiceScript::new().say("Thank you! Goodbye.").hangup()
}

/// Safe terminal script for callbacks whose correlation token cannot be
/// decoded. The provider still gets a well-formed response, so the leg ends
/// cleanly instead of erroring out.
pub fn invalid_session_script() -> VoiceScript {
    VoiceScript::new()
        .say("Sorry, this call session is no longer valid. Goodbye.")
        .hangup()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answer_script_has_one_single_digit_gather() {
        let script = answer_script("https://bot.example/voice/capture?token=abc");
        let gathers: Vec<_> = script
            .verbs()
            .iter()
            .filter_map(|v| match v {
                Verb::Gather {
                    num_digits, action, ..
                } => Some((*num_digits, action.clone())),
                _ => None,
            })
            .collect();

        assert_eq!(gathers.len(), 1);
        assert_eq!(gathers[0].0, 1);
        assert!(gathers[0].1.contains("token=abc"));
    }

    #[test]
    fn capture_script_is_terminal() {
        let script = capture_script();
        assert!(!script.collects_input());
        assert_eq!(script.verbs().last(), Some(&Verb::Hangup));
    }

    #[test]
    fn invalid_session_script_is_terminal() {
        let script = invalid_session_script();
        assert!(!script.collects_input());
        assert_eq!(script.verbs().last(), Some(&Verb::Hangup));
    }

    #[test]
    fn xml_serialization_shape() {
        let xml = answer_script("https://bot.example/voice/capture?token=abc").to_xml();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response>"));
        assert!(xml.ends_with("</Response>"));
        assert!(xml.contains("<Pause length=\"1\"/>"));
        assert!(xml.contains(
            "<Gather numDigits=\"1\" action=\"https://bot.example/voice/capture?token=abc\" method=\"POST\">"
        ));
    }

    #[test]
    fn xml_escapes_text_and_attributes() {
        let xml = VoiceScript::new()
            .say("a < b & c > \"d\"")
            .gather(1, "https://x/capture?a=1&b=2", "press 'one'")
            .to_xml();

        assert!(xml.contains("a &lt; b &amp; c &gt; &quot;d&quot;"));
        assert!(xml.contains("action=\"https://x/capture?a=1&amp;b=2\""));
        assert!(xml.contains("press &apos;one&apos;"));
        assert!(!xml.contains("a < b"));
    }
}
