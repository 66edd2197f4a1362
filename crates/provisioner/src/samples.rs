//! Copy-paste usage samples for a generated key.

use std::{fmt, str::FromStr};

use indoc::formatdoc;

/// Substituted for the key until one has been generated.
pub const KEY_PLACEHOLDER: &str = "<your-generated-key>";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleKind {
    PythonOpenAi,
    PythonLangchain,
    JsLangchain,
    Curl,
}

impl SampleKind {
    pub const ALL: [SampleKind; 4] = [
        SampleKind::PythonOpenAi,
        SampleKind::PythonLangchain,
        SampleKind::JsLangchain,
        SampleKind::Curl,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SampleKind::PythonOpenAi => "Python OpenAI",
            SampleKind::PythonLangchain => "Python Langchain",
            SampleKind::JsLangchain => "JS Langchain",
            SampleKind::Curl => "cURL",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SampleKind::PythonOpenAi => "python-openai",
            SampleKind::PythonLangchain => "python-langchain",
            SampleKind::JsLangchain => "js-langchain",
            SampleKind::Curl => "curl",
        }
    }
}

impl fmt::Display for SampleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SampleKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SampleKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let names: Vec<_> = SampleKind::ALL.iter().map(|kind| kind.name()).collect();
                format!("unknown sample '{s}', expected one of: {}", names.join(", "))
            })
    }
}

/// A rendered sample with its tab label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub kind: SampleKind,
    pub code: String,
}

/// Renders one sample. Without a key, [`KEY_PLACEHOLDER`] is used so the sample stays complete.
pub fn render(kind: SampleKind, key: Option<&str>, base_url: &str, model: &str) -> String {
    let key = key.filter(|key| !key.is_empty()).unwrap_or(KEY_PLACEHOLDER);
    let base_url = base_url.trim_end_matches('/');

    let code = match kind {
        SampleKind::PythonOpenAi => formatdoc! {r#"
            import openai
            client = openai.OpenAI(
                api_key="{key}",  # YOUR_API_KEY
                base_url="{base_url}"  # set openai_api_base to the LiteLLM Proxy
            )
            response = client.chat.completions.create(
                model="{model}",
                messages=[{{"role": "user", "content": "Hello, what llm are you?"}}]
            )
            print(response)
        "#, key = key, base_url = base_url, model = model},
        SampleKind::PythonLangchain => formatdoc! {r#"
            from langchain.chat_models import ChatOpenAI
            from langchain.schema import HumanMessage, SystemMessage

            chat = ChatOpenAI(
                openai_api_key="{key}",
                openai_api_base="{base_url}",  # set openai_api_base to the LiteLLM Proxy
                model="{model}",
                temperature=0.1,
            )

            messages = [
                SystemMessage(content="You are a helpful assistant."),
                HumanMessage(content="Hello, what llm are you?")
            ]
            response = chat(messages)
            print(response)
        "#, key = key, base_url = base_url, model = model},
        SampleKind::JsLangchain => formatdoc! {r#"
            import {{ ChatOpenAI }} from "@langchain/openai";

            const chat = new ChatOpenAI({{
              apiKey: "{key}",
              configuration: {{ baseURL: "{base_url}" }}, // set openai_api_base to the LiteLLM Proxy
              model: "{model}",
              temperature: 0.1,
            }});

            const messages = [
              {{ role: "system", content: "You are a helpful assistant." }},
              {{ role: "user", content: "Hello, what llm are you?" }}
            ];

            async function main() {{
              const response = await chat.invoke(messages);
              console.log(response);
            }}
            main();
        "#, key = key, base_url = base_url, model = model},
        SampleKind::Curl => formatdoc! {r#"
            curl --location '{base_url}/chat/completions' \
            --header 'Content-Type: application/json' \
            --header 'Authorization: Bearer {key}' \
            --data '{{
              "model": "{model}",
              "messages": [
                {{ "role": "user", "content": "Hello, what llm are you?" }}
              ]
            }}'
        "#, key = key, base_url = base_url, model = model},
    };

    code.trim_end().to_string()
}

/// Renders every sample, in tab order.
pub fn render_all(key: Option<&str>, base_url: &str, model: &str) -> Vec<Sample> {
    SampleKind::ALL
        .into_iter()
        .map(|kind| Sample {
            kind,
            code: render(kind, key, base_url, model),
        })
        .collect()
}
