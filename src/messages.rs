// 🌐 User-facing text per language
// Every string a user can see lives here so the pipeline stays language-agnostic.

use crate::config::Language;

pub struct Messages {
    language: Language,

    /// Question was empty or whitespace
    pub empty_question: &'static str,

    /// Search found no candidates in any language
    pub nothing_found: &'static str,

    /// Entity fetch came back empty
    pub entity_not_found: &'static str,

    /// Heading of the multi-result preview
    pub several_found: &'static str,

    /// Link text of the source line
    pub source: &'static str,

    /// Label of the control that requests every candidate
    pub show_more: &'static str,

    months: [&'static str; 12],
}

static RU: Messages = Messages {
    language: Language::Ru,
    empty_question: "Пожалуйста, введите вопрос.",
    nothing_found: "Ничего не найдено. Попробуй переформулировать.",
    entity_not_found: "Объект не найден.",
    several_found: "Я нашёл несколько объектов:\n",
    source: "Источник",
    show_more: "Показать ещё",
    // genitive case: "31 декабря"
    months: [
        "января", "февраля", "марта", "апреля", "мая", "июня",
        "июля", "августа", "сентября", "октября", "ноября", "декабря",
    ],
};

static EN: Messages = Messages {
    language: Language::En,
    empty_question: "Please enter a question.",
    nothing_found: "Nothing found. Try rephrasing the question.",
    entity_not_found: "Entity not found.",
    several_found: "I found several entities:\n",
    source: "Source",
    show_more: "Show more",
    months: [
        "January", "February", "March", "April", "May", "June",
        "July", "August", "September", "October", "November", "December",
    ],
};

static ZH: Messages = Messages {
    language: Language::Zh,
    empty_question: "请输入问题。",
    nothing_found: "未找到任何结果。请尝试换一种说法。",
    entity_not_found: "未找到该对象。",
    several_found: "我找到了几个对象：\n",
    source: "来源",
    show_more: "显示更多",
    months: [
        "1月", "2月", "3月", "4月", "5月", "6月",
        "7月", "8月", "9月", "10月", "11月", "12月",
    ],
};

impl Messages {
    pub fn for_language(lang: Language) -> &'static Messages {
        match lang {
            Language::Ru => &RU,
            Language::En => &EN,
            Language::Zh => &ZH,
        }
    }

    /// Tail of the preview when candidates were left out
    pub fn and_more(&self, remaining: usize) -> String {
        match self.language {
            Language::Ru => format!("\n... и ещё {}. Нажми «{}».", remaining, self.show_more),
            Language::En => format!("\n... and {} more. Press “{}”.", remaining, self.show_more),
            Language::Zh => format!("\n……还有 {} 个。点击“{}”。", remaining, self.show_more),
        }
    }

    /// Calendar date in the language's usual long form
    pub fn long_date(&self, year: i32, month: u32, day: u32) -> String {
        let idx = month.clamp(1, 12) as usize - 1;
        match self.language {
            Language::Ru => format!("{} {} {} года", day, self.months[idx], year),
            Language::En => format!("{} {} {}", day, self.months[idx], year),
            Language::Zh => format!("{}年{}{}日", year, self.months[idx], day),
        }
    }

    /// Markdown link line pointing at the entity's page
    pub fn source_link(&self, url: &str) -> String {
        format!("[🔗 {}]({})", self.source, url)
    }
}
