//! The reedline prompt: `<database>=# ` normally, `<database>-# ` while a
//! multi-line statement is accumulating.

use reedline::{Prompt, PromptEditMode, PromptHistorySearch, PromptHistorySearchStatus};
use std::borrow::Cow;

pub struct ShellPrompt {
    database: String,
    continuing: bool,
}

impl ShellPrompt {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            continuing: false,
        }
    }

    pub fn update_database(&mut self, database: &str) {
        if self.database != database {
            self.database = database.to_string();
        }
    }

    pub fn set_continuing(&mut self, continuing: bool) {
        self.continuing = continuing;
    }
}

impl Prompt for ShellPrompt {
    fn render_prompt_left(&self) -> Cow<'_, str> {
        if self.continuing {
            Cow::Owned(format!("{}-# ", self.database))
        } else {
            Cow::Owned(format!("{}=# ", self.database))
        }
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, edit_mode: PromptEditMode) -> Cow<'_, str> {
        match edit_mode {
            PromptEditMode::Default | PromptEditMode::Emacs => Cow::Borrowed(""),
            PromptEditMode::Vi(vi_mode) => match vi_mode {
                reedline::PromptViMode::Insert => Cow::Borrowed("[INS] "),
                reedline::PromptViMode::Normal => Cow::Borrowed("[NOR] "),
            },
            PromptEditMode::Custom(_) => Cow::Borrowed(""),
        }
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_history_search_indicator(
        &self,
        history_search: PromptHistorySearch,
    ) -> Cow<'_, str> {
        let _prefix = match history_search.status {
            PromptHistorySearchStatus::Passing => "",
            PromptHistorySearchStatus::Failing => "?",
        };
        match history_search.term.as_str() {
            "" => Cow::Borrowed("(reverse-i-search): "),
            _ => Cow::Owned(format!("(reverse-i-search '{}'): ", history_search.term)),
        }
    }
}
