#[cfg(test)]
#[path = "translations_test.rs"]
mod tests;

use crate::domain::models::Language;

/// User-facing strings the assistant emits on its own behalf.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phrase {
    Welcome,
    ConnectionError,
    EmptyReply,
    Offline,
    Listening,
    BackendUnreachable,
}

fn english(phrase: Phrase) -> &'static str {
    match phrase {
        Phrase::Welcome => return "Hello! Ask me about agriculture.",
        Phrase::ConnectionError => {
            return "Sorry, I cannot connect to the server. Please ensure the backend is running."
        }
        Phrase::EmptyReply => return "The server is running but returned no data.",
        Phrase::Offline => {
            return "You are offline. I will answer as soon as you are connected again."
        }
        Phrase::Listening => return "Listening...",
        Phrase::BackendUnreachable => {
            return "I can't reach the farm assistant server right now. You can keep typing, answers will fail until it is back."
        }
    }
}

fn hindi(phrase: Phrase) -> Option<&'static str> {
    match phrase {
        Phrase::Welcome => return Some("नमस्ते! खेती के बारे में मुझसे पूछें।"),
        Phrase::ConnectionError => {
            return Some("क्षमा करें, मैं सर्वर से कनेक्ट नहीं कर पा रहा हूँ।")
        }
        Phrase::EmptyReply => return Some("सर्वर चल रहा है लेकिन कोई जवाब नहीं मिला।"),
        Phrase::Offline => {
            return Some("आप ऑफ़लाइन हैं। कनेक्ट होते ही मैं जवाब दूँगा।")
        }
        Phrase::Listening => return Some("सुन रहा हूँ..."),
        Phrase::BackendUnreachable => return None,
    }
}

fn tamil(phrase: Phrase) -> Option<&'static str> {
    match phrase {
        Phrase::Welcome => {
            return Some("வணக்கம்! விவசாயம் பற்றி என்னிடம் கேளுங்கள்.")
        }
        Phrase::ConnectionError => {
            return Some("மன்னிக்கவும், சர்வருடன் இணைக்க முடியவில்லை.")
        }
        Phrase::Offline => return Some("நீங்கள் ஆஃப்லைனில் உள்ளீர்கள்."),
        Phrase::Listening => return Some("கேட்கிறேன்..."),
        _ => return None,
    }
}

fn telugu(phrase: Phrase) -> Option<&'static str> {
    match phrase {
        Phrase::Welcome => {
            return Some("నమస్కారం! వ్యవసాయం గురించి నన్ను అడగండి.")
        }
        Phrase::ConnectionError => {
            return Some("క్షమించండి, సర్వర్‌కు కనెక్ట్ కాలేకపోతున్నాను.")
        }
        Phrase::Offline => return Some("మీరు ఆఫ్‌లైన్‌లో ఉన్నారు."),
        Phrase::Listening => return Some("వింటున్నాను..."),
        _ => return None,
    }
}

fn kannada(phrase: Phrase) -> Option<&'static str> {
    match phrase {
        Phrase::Welcome => {
            return Some("ನಮಸ್ಕಾರ! ಕೃಷಿಯ ಬಗ್ಗೆ ನನ್ನನ್ನು ಕೇಳಿ.")
        }
        Phrase::Offline => return Some("ನೀವು ಆಫ್‌ಲೈನ್‌ನಲ್ಲಿದ್ದೀರಿ."),
        Phrase::Listening => return Some("ಕೇಳುತ್ತಿದ್ದೇನೆ..."),
        _ => return None,
    }
}

/// Localized text for `phrase`, falling back to English for languages or
/// phrases without a translation.
pub fn translate(language: Language, phrase: Phrase) -> &'static str {
    let localized = match language {
        Language::Hi => hindi(phrase),
        Language::Ta => tamil(phrase),
        Language::Te => telugu(phrase),
        Language::Kn => kannada(phrase),
        _ => None,
    };

    return localized.unwrap_or_else(|| return english(phrase));
}
