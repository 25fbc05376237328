//! Crisis escalation message.
//!
//! Fires on the QUERY, never on model output. The message is fixed text:
//! no coping steps, no instructions beyond reaching help, no citations.

/// Words at least one of which must appear in the English escalation paragraph.
pub const ESCALATION_KEYWORDS: &[&str] = &["emergency", "helpline", "urgent", "professional"];

const CRISIS_EN: &str = "I\u{2019}m really sorry you\u{2019}re feeling this way. If you are in \
    immediate danger or at risk of harming yourself or someone else, please contact local \
    emergency services right now, or reach a suicide prevention helpline. If you can, tell a \
    trusted person nearby and seek urgent help from a qualified mental health professional.";

const CRISIS_UR: &str = "Mujhe afsos hai ke aap aisa mehsoos kar rahe hain. Agar foran khatra \
    ho ya aap khud ko ya kisi aur ko nuqsan pohanchane ka irada mehsoos kar rahe hain, to \
    barah-e-karam foran apni ilaqai emergency services se rabta karein, ya suicide prevention \
    helpline ko call karein. Mumkin ho to kisi bharosemand shaks ko foran batayein aur kisi \
    mo\u{02bc}tabar mental health professional se fori imdad hasil karein.";

/// Educational-use disclaimer, English then Roman-Urdu.
pub const DISCLAIMER_EN: &str = "Disclaimer: Sukoon is for educational purposes and not a \
    substitute for professional medical or mental health advice.";
pub const DISCLAIMER_UR: &str = "Wazahat: Sukoon taleemi maqsad ke liye hai. Yeh kisi tabibi \
    ya zehni sehat ke mashwaray ka badal nahi.";

/// The English paragraph of the escalation message.
pub fn crisis_message_en() -> &'static str {
    CRISIS_EN
}

/// The two-paragraph bilingual escalation message (English, blank line, Roman-Urdu).
pub fn crisis_message() -> String {
    format!("{CRISIS_EN}\n\n{CRISIS_UR}")
}

/// The two-line bilingual disclaimer.
pub fn disclaimer() -> String {
    format!("{DISCLAIMER_EN}\n{DISCLAIMER_UR}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::rag::citation::has_citation_markers;

    #[test]
    fn message_has_two_paragraphs() {
        let msg = crisis_message();
        let paragraphs: Vec<&str> = msg.split("\n\n").collect();
        assert_eq!(paragraphs.len(), 2);
        assert_eq!(paragraphs[0], crisis_message_en());
    }

    #[test]
    fn english_paragraph_contains_escalation_keyword() {
        let en = crisis_message_en().to_lowercase();
        assert!(ESCALATION_KEYWORDS.iter().any(|k| en.contains(k)));
    }

    #[test]
    fn message_has_no_citation_markers() {
        assert!(!has_citation_markers(&crisis_message()));
    }

    #[test]
    fn message_has_no_step_lists() {
        let msg = crisis_message();
        assert!(!msg.contains("1."));
        assert!(!msg.contains("Step"));
        assert!(!msg.lines().any(|l| l.trim_start().starts_with('-')));
    }

    #[test]
    fn disclaimer_is_bilingual() {
        let d = disclaimer();
        assert!(d.contains("educational"));
        assert!(d.contains("taleemi"));
    }
}
