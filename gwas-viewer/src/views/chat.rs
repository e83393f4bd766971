//! Chat view
//!
//! The browser keeps the conversation (in `sessionStorage`, per document) and
//! posts it with every question to `POST /api/chat`.

use std::fmt::Write as _;

use super::escape_html;
use gwas_common::config::{MAX_CONTEXT_PAGES, MIN_CONTEXT_PAGES};

/// Settings offered on the chat page
pub struct ChatPage<'a> {
    pub document_id: &'a str,
    pub models: &'a [String],
    pub default_model: &'a str,
    pub default_context_pages: u32,
}

pub fn render(page: &ChatPage<'_>) -> String {
    let mut html = String::from(
        r#"<h2>🤖 Ask Questions About This Document</h2><p class="subtitle">Ask questions about the research paper and get answers with source citations</p>"#,
    );

    html.push_str(r#"<details><summary>⚙️ Chat Settings</summary><div class="columns"><div><label for="chat-model">Select AI Model</label> <select id="chat-model">"#);
    for model in page.models {
        let selected = if model == page.default_model { " selected" } else { "" };
        let _ = write!(
            html,
            r#"<option value="{m}"{selected}>{m}</option>"#,
            m = escape_html(model)
        );
    }
    let _ = write!(
        html,
        r#"</select></div><div><label for="context-pages">Context Pages: <span id="context-pages-value">{d}</span></label>
<input id="context-pages" type="range" min="{min}" max="{max}" value="{d}"></div></div>
<button type="button" id="clear-chat">🗑️ Clear Chat History</button></details>"#,
        d = page.default_context_pages,
        min = MIN_CONTEXT_PAGES,
        max = MAX_CONTEXT_PAGES
    );

    let _ = write!(
        html,
        r#"<div id="chat-log" class="chat-log"></div>
<form id="chat-form"><textarea id="chat-question" rows="3" style="width: 100%" placeholder="Ask a question about this GWAS paper..."></textarea>
<button type="submit" id="chat-send">Send</button></form>
<div id="chat-data" data-document="{}" hidden></div>
<script>{}</script>"#,
        escape_html(page.document_id),
        CHAT_JS
    );

    html
}

const CHAT_JS: &str = r#"
(function () {
  const documentId = document.getElementById('chat-data').dataset.document;
  const storageKey = 'gwas-chat:' + documentId;
  const sessionKey = 'gwas-chat-session:' + documentId;
  const log = document.getElementById('chat-log');
  const form = document.getElementById('chat-form');
  const input = document.getElementById('chat-question');
  const send = document.getElementById('chat-send');
  const model = document.getElementById('chat-model');
  const pages = document.getElementById('context-pages');
  const pagesValue = document.getElementById('context-pages-value');

  function load() {
    try { return JSON.parse(sessionStorage.getItem(storageKey)) || []; } catch (e) { return []; }
  }
  function save(history) { sessionStorage.setItem(storageKey, JSON.stringify(history)); }

  function render(history) {
    log.textContent = '';
    for (const message of history) {
      const div = document.createElement('div');
      div.className = 'chat-message ' + message.role;
      div.textContent = (message.role === 'assistant' ? '🤖 ' : '👤 ') + message.content;
      log.appendChild(div);
    }
  }

  pages.addEventListener('input', () => { pagesValue.textContent = pages.value; });
  document.getElementById('clear-chat').addEventListener('click', () => { save([]); render([]); });

  form.addEventListener('submit', async (event) => {
    event.preventDefault();
    const question = input.value.trim();
    if (!question) return;
    const history = load();
    render(history.concat([{ role: 'user', content: question }]));
    send.disabled = true;
    try {
      const response = await fetch('/api/chat', {
        method: 'POST',
        headers: { 'Content-Type': 'application/json' },
        body: JSON.stringify({
          session_id: sessionStorage.getItem(sessionKey),
          document_id: documentId,
          question: question,
          model: model.value,
          context_pages: Number(pages.value),
          history: history
        })
      });
      const body = await response.json();
      if (response.ok) {
        sessionStorage.setItem(sessionKey, body.session_id);
        save(body.history);
        render(body.history);
        input.value = '';
      } else {
        const failed = history.concat([
          { role: 'user', content: question },
          { role: 'assistant', content: 'Error: ' + body.error.message }
        ]);
        save(failed);
        render(failed);
      }
    } catch (err) {
      render(history.concat([{ role: 'assistant', content: 'Error: ' + err }]));
    } finally {
      send.disabled = false;
    }
  });

  render(load());
})();
"#;
