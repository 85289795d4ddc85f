//! Prompt templates and context rendering.

use advisor_core::{Language, WeatherSnapshot};
use advisor_weather::weather_summary;

const SYSTEM_PROMPT_EN: &str = r#"You are a friendly and helpful conversational AI assistant. You chat naturally with users and answer their questions.

Your special abilities:
- You can fetch real-time weather information for any city in the world
- You can provide activity, outfit, and outing suggestions based on weather

Important instructions:
1. **Normal conversation**: For greetings and general questions, respond naturally. Don't force weather into every conversation.
2. **When to use weather**: Only use the get_weather tool when users ask about weather, activities, what to wear, or plans that depend on weather conditions.
3. **Be concise**: Keep responses short, friendly, and conversational.
4. **Language**: You must reply in English.

Examples:
- User: "hi" → You: "Hi! How can I help you today?"
- User: "what's the weather in Tokyo?" → You: Use get_weather tool to fetch weather
- User: "what should I do today?" → You: Use get_weather tool if you know the location, or ask for their location"#;

const SYSTEM_PROMPT_JA: &str = r#"あなたは親切でフレンドリーな会話型AIアシスタントです。ユーザーと自然に会話し、質問に答えます。

あなたの特別な能力：
- 世界中の都市のリアルタイム天気情報を取得できます
- 天気に基づいて、アクティビティ、服装、外出のアイデアを提案できます

重要な指示：
1. **普通の会話**: 挨拶や一般的な質問には、自然に会話してください。天気に関係ない場合は、天気の話をしないでください。
2. **天気を使うタイミング**: ユーザーが天気、活動、服装、外出プランについて尋ねた時だけ、get_weatherツールを使用してください。
3. **簡潔に**: 短く、フレンドリーに、会話的に応答してください。
4. **言語**: 日本語で返信してください。

例：
- ユーザー: "こんにちは" → あなた: "こんにちは！何かお手伝いできることはありますか？"
- ユーザー: "東京の天気は？" → あなた: get_weatherツールを使用して天気を取得
- ユーザー: "今日何する？" → あなた: get_weatherツールを使用（場所がわかる場合）"#;

/// Base system prompt for a language.
pub fn base_system_prompt(language: Language) -> &'static str {
    match language {
        Language::En => SYSTEM_PROMPT_EN,
        Language::Ja => SYSTEM_PROMPT_JA,
    }
}

/// System prompt, with the last-known weather appended as background
/// knowledge when there is one.
pub fn system_prompt(language: Language, weather: Option<&WeatherSnapshot>) -> String {
    let mut prompt = base_system_prompt(language).to_string();
    if let Some(snapshot) = weather {
        prompt.push_str("\n\n");
        prompt.push_str(&weather_context(snapshot));
    }
    prompt
}

/// Bracketed block describing the weather the model may draw on.
pub fn weather_context(s: &WeatherSnapshot) -> String {
    format!(
        "[Available weather data for {place}:\n\
         Temperature: {temp}°C (feels like {feels}°C)\n\
         Condition: {condition}\n\
         Humidity: {humidity}%\n\
         Wind: {wind} km/h\n\
         UV Index: {uv}\n\
         Precipitation: {precip} mm\n\
         Local time: {time}]",
        place = s.place(),
        temp = s.temp_c,
        feels = s.feelslike_c,
        condition = s.condition,
        humidity = s.humidity,
        wind = s.wind_kph,
        uv = s.uv,
        precip = s.precip_mm,
        time = s.local_time,
    )
}

/// The synthetic user request used for an unprompted initial suggestion.
pub fn initial_request(language: Language) -> &'static str {
    match language {
        Language::En => "Based on this weather, give me some quick activity and outfit suggestions.",
        Language::Ja => "この天気に基づいて、簡単なアクティビティや服装の提案をしてください。",
    }
}

/// Single-shot prompt embedding freshly fetched weather alongside the
/// user's original question.
pub fn weather_grounded_prompt(language: Language, weather: &WeatherSnapshot, query: &str) -> String {
    let summary = weather_summary(weather);
    match language {
        Language::En => format!(
            "{summary}\n\nUser query: {query}\n\nProvide detailed suggestions considering the weather above."
        ),
        Language::Ja => format!(
            "{summary}\n\nユーザーの質問: {query}\n\n上記の天気を考慮して、詳細な提案を提供してください。"
        ),
    }
}

/// Tool-result text for a failed lookup.
pub fn lookup_failure(location: &str, error: &dyn std::fmt::Display) -> String {
    format!("Error fetching weather for {location}: {error}")
}
