//! Terminal layout: banner, menu, prediction block, news cards, footer

use chrono::{DateTime, Local};

use crate::disease::Prediction;
use crate::i18n::{Language, Strings};
use crate::news::{NewsArticle, Page};

use super::Section;

const RULE: &str = "------------------------------------------------------------";

pub fn banner(language: Language) -> String {
    let strings = language.strings();
    format!(
        "{rule}\n  Krishi Sahayak  |  {}\n{rule}",
        strings.sidebar_title,
        rule = RULE
    )
}

/// Numbered section list, with the language toggle and quit keys
pub fn menu(language: Language, current: Section) -> String {
    let strings = language.strings();
    let mut out = format!("{}:\n", strings.go_to_label);

    for (i, section) in Section::ALL.iter().enumerate() {
        let marker = if *section == current { '>' } else { ' ' };
        out.push_str(&format!("{} {}. {}\n", marker, i + 1, section.label(strings)));
    }

    out.push_str(&format!("  l. {}\n", strings.switch_language));
    out.push_str("  q. Quit");
    out
}

/// Section heading plus its one-line description
pub fn section_header(section: Section, strings: &Strings) -> String {
    let (title, description) = match section {
        Section::Chatbot => (strings.ai_chatbot_page_title, strings.ai_chatbot_description),
        Section::DiseaseDetection => (
            strings.crop_detection_title,
            strings.crop_detection_description,
        ),
        Section::Schemes => (
            strings.govt_schemes_page_title,
            strings.govt_schemes_description,
        ),
        Section::News => (strings.agri_news, strings.agri_news_subtitle),
    };
    format!("\n== {} ==\n{}\n", title, description)
}

pub fn prediction_block(prediction: &Prediction, strings: &Strings) -> String {
    let mut out = format!("\n{}\n", strings.prediction_results);
    out.push_str(&format!("  {} {}\n", strings.disease_label, prediction.disease));
    out.push_str(&format!(
        "  {} {:.1}%\n",
        strings.confidence_label,
        prediction.confidence * 100.0
    ));

    if !prediction.alternatives.is_empty() {
        out.push_str(&format!("\n{}\n", strings.alternatives_label));
        for alt in &prediction.alternatives {
            out.push_str(&format!("  - {}: {:.1}%\n", alt.disease, alt.confidence * 100.0));
        }
    }

    match &prediction.remedy {
        Some(remedy) => {
            out.push_str(&format!("\n{}\n", strings.treatment_recommendation));
            out.push_str(&format!("  {}\n", remedy.text));
            out.push_str(&format!(
                "  {} {}\n",
                strings.marathi_translation_label, remedy.translation
            ));
        }
        None => out.push_str(&format!("\n{}\n", strings.healthy)),
    }

    out
}

pub fn news_card(article: &NewsArticle, strings: &Strings) -> String {
    format!(
        "* {}\n  {}\n  {}: {}\n",
        truncate_text(&article.title, 120),
        truncate_text(&article.description, 240),
        strings.read_more,
        article.link
    )
}

pub fn news_page(page: &Page<'_>, strings: &Strings, updated: Option<DateTime<Local>>) -> String {
    if page.items.is_empty() {
        return format!("{}\n", strings.no_news);
    }

    let mut out = String::new();
    if let Some(ts) = updated {
        out.push_str(&format!("({})\n", ts.format("%Y-%m-%d %H:%M")));
    }
    for article in page.items {
        out.push_str(&news_card(article, strings));
        out.push('\n');
    }
    out.push_str(&format!(
        "{} {}/{}",
        strings.page_label, page.number, page.total_pages
    ));
    out
}

pub fn footer() -> String {
    format!(
        "{}\n  Krishi Sahayak v{}  |  Made for farmers",
        RULE,
        env!("CARGO_PKG_VERSION")
    )
}

/// Single-line, char-safe truncation
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    let cleaned = text.replace('\n', " ").replace('\r', "");
    let cleaned = cleaned.trim();

    if cleaned.chars().count() <= max_chars {
        cleaned.to_string()
    } else {
        let truncated: String = cleaned.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disease::{Alternative, Remedy};
    use crate::news::paginate;

    fn prediction(remedy: Option<Remedy>) -> Prediction {
        Prediction {
            index: 1,
            disease: "Tomato___Late_blight".to_string(),
            confidence: 0.8734,
            alternatives: vec![Alternative {
                disease: "Tomato___Early_blight".to_string(),
                confidence: 0.11,
            }],
            remedy,
        }
    }

    #[test]
    fn test_prediction_block_infected() {
        let strings = Language::English.strings();
        let block = prediction_block(
            &prediction(Some(Remedy {
                text: "Use neem oil".to_string(),
                translation: "निंबोळी तेल वापरा".to_string(),
            })),
            strings,
        );

        assert!(block.contains("Confidence: 87.3%"));
        assert!(block.contains("  - Tomato___Early_blight: 11.0%"));
        assert!(block.contains("Use neem oil"));
        assert!(block.contains("Marathi Translation: निंबोळी तेल वापरा"));
        assert!(!block.contains(strings.healthy));
    }

    #[test]
    fn test_prediction_block_healthy() {
        let strings = Language::Marathi.strings();
        let block = prediction_block(&prediction(None), strings);
        assert!(block.contains(strings.healthy));
        assert!(!block.contains(strings.treatment_recommendation));
    }

    #[test]
    fn test_menu_marks_current() {
        let menu = menu(Language::English, Section::Schemes);
        assert!(menu.contains("> 3. Government Schemes"));
        assert!(menu.contains("  1. AI Chatbot"));
        assert!(menu.contains("l. Switch to Marathi"));
    }

    #[test]
    fn test_news_page() {
        let strings = Language::English.strings();
        let articles = vec![NewsArticle {
            link: "https://example.com/a".to_string(),
            title: "Rabi outlook".to_string(),
            description: "Wheat acreage\nexpected to rise".to_string(),
        }];

        let out = news_page(&paginate(&articles, 1, 5), strings, None);
        assert!(out.contains("* Rabi outlook"));
        assert!(out.contains("Wheat acreage expected to rise"));
        assert!(out.contains("Read more: https://example.com/a"));
        assert!(out.ends_with("Page 1/1"));

        let empty = news_page(&paginate(&[], 1, 5), strings, None);
        assert_eq!(empty.trim(), strings.no_news);
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("hello", 10), "hello");
        assert_eq!(truncate_text("hello world", 5), "hello...");
        assert_eq!(truncate_text("शेती बातम्या", 4), "शेती...");
    }
}
