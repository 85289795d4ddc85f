//! Localized UI strings and example prompts.

use std::collections::BTreeMap;

use crate::types::Language;

const EN_STRINGS: &[(&str, &str)] = &[
    ("title", "🌤️ Weather Activity Advisor"),
    (
        "subtitle",
        "Get personalized activity suggestions based on real-time weather",
    ),
    ("location_input", "Enter your location (city name)"),
    ("location_placeholder", "e.g., Tokyo, New York, London"),
    ("get_weather", "Get Weather & Suggestions"),
    ("voice_input", "🎤 Voice Input"),
    (
        "chat_input",
        "Ask me anything about activities, fashion, or plans...",
    ),
    ("example_prompts", "Example Prompts:"),
    ("weather_info", "Current Weather Information"),
    ("suggestions", "AI Suggestions"),
    ("chat_history", "Chat History"),
    ("clear_chat", "Clear Chat"),
    ("error", "Error"),
    (
        "weather_fetch_error",
        "Could not fetch weather data. Please check the location.",
    ),
    ("language", "Language"),
];

const JA_STRINGS: &[(&str, &str)] = &[
    ("title", "🌤️ 天気アクティビティアドバイザー"),
    (
        "subtitle",
        "リアルタイムの天気に基づいてパーソナライズされたアクティビティ提案を取得",
    ),
    ("location_input", "場所を入力してください（都市名）"),
    ("location_placeholder", "例：東京、大阪、札幌"),
    ("get_weather", "天気と提案を取得"),
    ("voice_input", "🎤 音声入力"),
    (
        "chat_input",
        "アクティビティ、ファッション、プランについて何でも聞いてください...",
    ),
    ("example_prompts", "例のプロンプト："),
    ("weather_info", "現在の気象情報"),
    ("suggestions", "AI提案"),
    ("chat_history", "チャット履歴"),
    ("clear_chat", "チャットをクリア"),
    ("error", "エラー"),
    (
        "weather_fetch_error",
        "天気データを取得できませんでした。場所を確認してください。",
    ),
    ("language", "言語"),
];

const EN_EXAMPLES: &[&str] = &[
    "What should I wear today?",
    "Best time to go outside?",
    "Indoor activities for this weather?",
    "Recommended sports for this weather?",
];

const JA_EXAMPLES: &[&str] = &[
    "今日は何を着ればいいですか？",
    "外出するのに良い時間は？",
    "雨が降るので、室内でできることは？",
    "この天気でおすすめのスポーツは？",
];

/// The UI string bundle for a language, keyed by string id.
pub fn translations(language: Language) -> BTreeMap<&'static str, &'static str> {
    let table = match language {
        Language::En => EN_STRINGS,
        Language::Ja => JA_STRINGS,
    };
    table.iter().copied().collect()
}

/// Look up a single UI string. Unknown keys return the key itself.
pub fn tr(language: Language, key: &'static str) -> &'static str {
    let table = match language {
        Language::En => EN_STRINGS,
        Language::Ja => JA_STRINGS,
    };
    table
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| *v)
        .unwrap_or(key)
}

/// Fixed example prompts shown to the user.
pub fn example_prompts(language: Language) -> &'static [&'static str] {
    match language {
        Language::En => EN_EXAMPLES,
        Language::Ja => JA_EXAMPLES,
    }
}
