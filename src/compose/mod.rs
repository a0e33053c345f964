// src/compose/mod.rs
//! Post composer: prompt → provider chain → cleanup → validation.

pub mod markup;
pub mod provider;

use metrics::counter;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;

use crate::feed::{normalize_text, NewsCandidate};
pub use provider::{extract_content, ChatCompletionsProvider, TextProvider};

pub const DEFAULT_MIN_POST_WORDS: usize = 20;
pub const DEFAULT_MIN_POST_CHARS: usize = 40;

const EMOJIS: &[&str] = &["🚀", "💡", "🔥", "🧠", "📢", "🔧", "⚙️", "🌐", "📱", "🎮"];
const HASHTAGS: &[&str] = &[
    "#Программирование",
    "#3D",
    "#AI",
    "#Новости",
    "#Графика",
    "#Технологии",
];

/// Text ready for the publisher. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedPost {
    pub text: String,
    pub candidate: NewsCandidate,
    /// Provider that produced the text.
    pub provider: String,
}

/// Why a generated text was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invalid {
    TooFewWords(usize),
    TooShort(usize),
}

/// Word and character minimums, measured on the text without markup.
pub fn validate(text: &str, min_words: usize, min_chars: usize) -> Result<(), Invalid> {
    let plain = normalize_text(text);
    let words = plain.split_whitespace().count();
    if words < min_words {
        return Err(Invalid::TooFewWords(words));
    }
    let chars = plain.chars().count();
    if chars < min_chars {
        return Err(Invalid::TooShort(chars));
    }
    Ok(())
}

/// Instruction prompt for one candidate.
pub fn build_prompt(c: &NewsCandidate, date: &str, emoji: &str, hashtags: &[&str]) -> String {
    format!(
        r#"Ты — Telegram-бот, публикующий IT-новости для начинающих. Сделай понятный пост на русском языке, который будет интересен даже тем, кто только начал изучать программирование или 3D-графику.

Структура поста:
1. Заголовок жирным (<b>…</b>), в начале эмодзи {emoji}.
2. Строка с датой и источником: {date}, {source}.
3. Основной текст: от 2 до 10 предложений простым живым языком, без сложных терминов; поясни незнакомые слова.
4. Вопрос к читателям для обсуждения.
5. Ссылка на источник в конце в виде <a href="{link}">Источник</a>.
6. Хештеги в последней строке: {hashtags}.

Без маркировок вроде "факт 1", "доп.инфо". Стиль — дружелюбный, как от человека.
Используй только теги <b>, <i>, <u>, <s>, <a>, <code>. Никакого Markdown.

Исходные данные:
Заголовок: {title}
Описание: {summary}
Ссылка: {link}
Источник: {source}
Дата: {date}"#,
        emoji = emoji,
        date = date,
        source = c.source,
        link = c.link,
        title = c.title,
        summary = c.summary_text(),
        hashtags = hashtags.join(" "),
    )
}

/// Ordered chain of providers; later ones are tried only when an earlier
/// call fails or returns no content.
pub struct PostComposer {
    providers: Vec<Box<dyn TextProvider>>,
    min_words: usize,
    min_chars: usize,
}

impl PostComposer {
    pub fn new(providers: Vec<Box<dyn TextProvider>>, min_words: usize, min_chars: usize) -> Self {
        Self {
            providers,
            min_words,
            min_chars,
        }
    }

    /// `None` when every provider failed or the produced text is too short.
    pub async fn compose(&self, c: &NewsCandidate, rng: &mut StdRng) -> Option<ComposedPost> {
        let emoji = EMOJIS.choose(rng).copied().unwrap_or("📢");
        let hashtags: Vec<&str> = HASHTAGS.choose_multiple(rng, 2).copied().collect();
        let date = chrono::Local::now().format("%d.%m.%Y").to_string();
        let prompt = build_prompt(c, &date, emoji, &hashtags);

        for p in &self.providers {
            let raw = match p.generate(&prompt).await {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::warn!(error = ?e, provider = p.name(), "generation failed, trying next provider");
                    counter!("bot_provider_failures_total").increment(1);
                    continue;
                }
            };

            let text = markup::to_telegram_html(&markup::strip_code_fences(&raw));
            if text.is_empty() {
                tracing::warn!(provider = p.name(), "generation returned only markup");
                counter!("bot_provider_failures_total").increment(1);
                continue;
            }

            // A present-but-short answer is not a provider failure: no fallback.
            return match validate(&text, self.min_words, self.min_chars) {
                Ok(()) => {
                    tracing::info!(provider = p.name(), chars = text.chars().count(), "post composed");
                    Some(ComposedPost {
                        text,
                        candidate: c.clone(),
                        provider: p.name().to_string(),
                    })
                }
                Err(why) => {
                    tracing::warn!(provider = p.name(), reason = ?why, "generated post rejected");
                    None
                }
            };
        }

        tracing::warn!(link = %c.link, "all text providers failed");
        None
    }
}
