//! Bilingual display strings (English / Marathi)

use std::fmt;
use std::str::FromStr;

/// Session display language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    English,
    Marathi,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Marathi => "mr",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Language::English => Language::Marathi,
            Language::Marathi => Language::English,
        }
    }

    /// Output-language directive placed in assistant prompts
    pub fn answer_instruction(self) -> &'static str {
        match self {
            Language::English => "Note: Please answer in English.",
            Language::Marathi => "Note: Please answer in Marathi",
        }
    }

    pub fn strings(self) -> &'static Strings {
        Strings::for_language(self)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Language::English),
            "mr" | "marathi" => Ok(Language::Marathi),
            other => Err(format!("unsupported language '{}', expected en or mr", other)),
        }
    }
}

/// Display string table for one language
#[derive(Debug)]
pub struct Strings {
    // Navigation
    pub switch_language: &'static str,
    pub sidebar_title: &'static str,
    pub go_to_label: &'static str,
    pub ai_chatbot: &'static str,
    pub crop_detection: &'static str,
    pub govt_schemes: &'static str,
    pub agri_news: &'static str,

    // AI chatbot
    pub ai_chatbot_page_title: &'static str,
    pub ai_chatbot_description: &'static str,

    // Crop disease detection
    pub crop_detection_title: &'static str,
    pub crop_detection_description: &'static str,
    pub crop_upload: &'static str,
    pub uploaded_caption: &'static str,
    pub analyzing: &'static str,
    pub prediction_results: &'static str,
    pub disease_label: &'static str,
    pub confidence_label: &'static str,
    pub treatment_recommendation: &'static str,
    pub marathi_translation_label: &'static str,
    pub healthy: &'static str,
    pub alternatives_label: &'static str,
    pub detection_error: &'static str,

    // Government schemes
    pub govt_schemes_page_title: &'static str,
    pub govt_schemes_description: &'static str,

    // Chat
    pub chat_prompt: &'static str,
    pub chat_error: &'static str,

    // News
    pub agri_news_subtitle: &'static str,
    pub fetch_latest: &'static str,
    pub success_news: &'static str,
    pub no_news: &'static str,
    pub page_label: &'static str,
    pub read_more: &'static str,

    // Scraper placeholders
    pub no_title: &'static str,
    pub no_description: &'static str,
    pub error_title: &'static str,
    pub error_description: &'static str,
}

static ENGLISH: Strings = Strings {
    switch_language: "Switch to Marathi",
    sidebar_title: "Navigation",
    go_to_label: "Go to",
    ai_chatbot: "AI Chatbot",
    crop_detection: "Crop Disease Detection",
    govt_schemes: "Government Schemes",
    agri_news: "Agricultural News",

    ai_chatbot_page_title: "Agricultural Assistant Chatbot",
    ai_chatbot_description: "Ask questions about crops, soil, and diseases.",

    crop_detection_title: "🌿 Crop Disease Detection",
    crop_detection_description:
        "Upload an image of your crop to detect diseases and get treatment recommendations.",
    crop_upload: "📤 Crop image path",
    uploaded_caption: "Uploaded Crop Image",
    analyzing: "Analyzing the image... Please wait.",
    prediction_results: "🩺 Prediction Results",
    disease_label: "Disease:",
    confidence_label: "Confidence:",
    treatment_recommendation: "💊 Treatment Recommendation",
    marathi_translation_label: "Marathi Translation:",
    healthy: "The plant appears to be healthy. No treatment necessary.",
    alternatives_label: "Alternative Possibilities:",
    detection_error: "🚨 An error occurred while processing the image",

    govt_schemes_page_title: "Government Schemes Assistant Chatbot",
    govt_schemes_description: "Ask questions to get most out of the Government Schemes",

    chat_prompt: "Type your message...",
    chat_error: "🚨 Could not get a response",

    agri_news_subtitle: "Latest Agricultural News",
    fetch_latest: "Fetch Latest",
    success_news: "Latest news fetched successfully!",
    no_news: "No news yet. Fetch the latest articles first.",
    page_label: "Page",
    read_more: "Read more",

    no_title: "No Title Found",
    no_description: "No Description Found",
    error_title: "Error Fetching Title",
    error_description: "Error Fetching Description",
};

static MARATHI: Strings = Strings {
    switch_language: "Switch to English",
    sidebar_title: "नेव्हिगेशन",
    go_to_label: "वर जा",
    ai_chatbot: "एआय चॅटबोट",
    crop_detection: "पिकांचे रोग शोधा",
    govt_schemes: "सरकारी योजना",
    agri_news: "कृषी बातम्या",

    ai_chatbot_page_title: "कृषी सहाय्यक चॅटबोट",
    ai_chatbot_description: "पिके, माती आणि रोग यांच्याबद्दल प्रश्न विचारा.",

    crop_detection_title: "🌿 पिकांचे रोग शोधा",
    crop_detection_description:
        "तुमच्या पिकाचे चित्र अपलोड करा, रोग ओळखा आणि उपचार शिफारसी मिळवा.",
    crop_upload: "📤 पिकाच्या चित्राचा मार्ग",
    uploaded_caption: "अपलोड केलेले पिकाचे चित्र",
    analyzing: "चित्राचा अभ्यास केला जात आहे... कृपया थांबा.",
    prediction_results: "🩺 भविष्यवाणी निकाल",
    disease_label: "रोग:",
    confidence_label: "विश्वास:",
    treatment_recommendation: "💊 उपचार शिफारस",
    marathi_translation_label: "मराठी अनुवाद:",
    healthy: "पिकं निरोगी दिसत आहेत. कोणताही उपचार आवश्यक नाही.",
    alternatives_label: "पर्यायी शक्यता:",
    detection_error: "🚨 चित्रावर प्रक्रिया करताना त्रुटी आली",

    govt_schemes_page_title: "सरकारी योजना सहाय्यक चॅटबोट",
    govt_schemes_description: "सरकारी योजना यांचा पुरेपूर लाभ घेण्यासाठी प्रश्न विचारा.",

    chat_prompt: "तुमचा संदेश लिहा...",
    chat_error: "🚨 उत्तर मिळू शकले नाही",

    agri_news_subtitle: "ताज्या कृषी बातम्या",
    fetch_latest: "ताज्या बातम्या आणा",
    success_news: "ताज्या बातम्या यशस्वीपणे आणल्या!",
    no_news: "अद्याप बातम्या नाहीत. आधी ताज्या बातम्या आणा.",
    page_label: "पान",
    read_more: "अधिक वाचा",

    no_title: "शिर्षक सापडले नाही",
    no_description: "वर्णन सापडले नाही",
    error_title: "शिर्षक प्राप्त करताना त्रुटी",
    error_description: "वर्णन प्राप्त करताना त्रुटी",
};

impl Strings {
    pub fn for_language(language: Language) -> &'static Strings {
        match language {
            Language::English => &ENGLISH,
            Language::Marathi => &MARATHI,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_round_trip() {
        assert_eq!(Language::English.toggle(), Language::Marathi);
        assert_eq!(Language::English.toggle().toggle(), Language::English);
    }

    #[test]
    fn test_parse_language() {
        assert_eq!("en".parse::<Language>().unwrap(), Language::English);
        assert_eq!("MR".parse::<Language>().unwrap(), Language::Marathi);
        assert!("fr".parse::<Language>().is_err());
    }

    #[test]
    fn test_string_tables_differ() {
        let en = Language::English.strings();
        let mr = Language::Marathi.strings();
        assert_ne!(en.ai_chatbot, mr.ai_chatbot);
        assert_eq!(en.no_title, "No Title Found");
        assert_eq!(mr.no_description, "वर्णन सापडले नाही");
    }

    #[test]
    fn test_answer_instruction() {
        assert!(Language::Marathi.answer_instruction().contains("Marathi"));
        assert!(Language::English.answer_instruction().ends_with("English."));
    }
}
