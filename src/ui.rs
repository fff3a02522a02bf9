//! Embedded single-page UI: a conversation pane and a PDF viewer pane.
//!
//! The page is served at `GET /` and talks to the JSON API with `fetch`.
//! Keeping it inline means the binary ships self-contained; there is no
//! asset pipeline to run. The viewer iframe is fed the base64 excerpt
//! returned by `POST /question` as a `data:` URL, with the `#page=`
//! fragment pointing the browser's PDF viewer at the focus page inside
//! the excerpt.

/// Full HTML document for the chat page.
pub const PAGE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Pagechat</title>
<style>
  * { box-sizing: border-box; }
  body {
    font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
    margin: 0;
    height: 100vh;
    display: flex;
    background: #f4f5f7;
    color: #1f2430;
  }
  .pane { flex: 1; display: flex; flex-direction: column; padding: 1.25rem; min-width: 0; }
  .chat-pane { border-right: 1px solid #d8dce3; max-width: 560px; }
  h1 { font-size: 1.3rem; margin: 0 0 0.75rem; }
  .upload { display: flex; gap: 0.5rem; margin-bottom: 0.5rem; }
  .status { font-size: 0.85rem; color: #5a6372; min-height: 1.2rem; margin-bottom: 0.75rem; }
  .status.error { color: #b42318; }
  .ask { display: flex; gap: 0.5rem; margin-bottom: 1rem; }
  .ask input { flex: 1; padding: 0.5rem; border: 1px solid #c4cad4; border-radius: 4px; }
  button {
    padding: 0.5rem 0.9rem;
    border: none;
    border-radius: 4px;
    background: #2f6fed;
    color: #fff;
    cursor: pointer;
  }
  button:disabled { background: #9db4e8; cursor: wait; }
  .chat {
    flex: 1;
    overflow-y: auto;
    display: flex;
    flex-direction: column;
    gap: 0.6rem;
    padding-right: 0.25rem;
  }
  .turn { border-radius: 6px; padding: 0.6rem 0.8rem; font-size: 0.92rem; white-space: pre-wrap; }
  .turn.user { background: #2f6fed; color: #fff; align-self: flex-end; max-width: 85%; }
  .turn.bot { background: #fff; border: 1px solid #d8dce3; align-self: flex-start; max-width: 92%; }
  .turn .page-ref { display: block; margin-top: 0.4rem; font-size: 0.78rem; color: #5a6372; }
  .viewer-pane { background: #e9ebef; }
  .caption { font-size: 0.85rem; color: #5a6372; margin-bottom: 0.5rem; min-height: 1.2rem; }
  iframe { flex: 1; width: 100%; border: 1px solid #c4cad4; border-radius: 4px; background: #fff; }
  .placeholder {
    flex: 1;
    display: flex;
    align-items: center;
    justify-content: center;
    color: #8a93a3;
    font-size: 0.95rem;
    border: 1px dashed #c4cad4;
    border-radius: 4px;
  }
</style>
</head>
<body>
<section class="pane chat-pane">
  <h1>Pagechat</h1>
  <div class="upload">
    <input type="file" id="pdf-input" accept="application/pdf">
    <button id="process-btn">Process</button>
  </div>
  <div class="status" id="status">No document loaded. Upload a PDF to begin.</div>
  <div class="ask">
    <input type="text" id="question-input" placeholder="Ask a question about the uploaded PDF" autocomplete="off">
    <button id="ask-btn">Ask</button>
  </div>
  <div class="chat" id="chat"></div>
</section>
<section class="pane viewer-pane">
  <div class="caption" id="caption">Answer sources appear here.</div>
  <div class="placeholder" id="placeholder">Ask a question to preview the matched pages.</div>
  <iframe id="viewer" title="Matched pages" hidden></iframe>
</section>
<script>
const statusEl = document.getElementById('status');
const chatEl = document.getElementById('chat');
const captionEl = document.getElementById('caption');
const viewerEl = document.getElementById('viewer');
const placeholderEl = document.getElementById('placeholder');
const questionEl = document.getElementById('question-input');
const askBtn = document.getElementById('ask-btn');
const processBtn = document.getElementById('process-btn');
let pageCount = 0;

function setStatus(text, isError) {
  statusEl.textContent = text;
  statusEl.classList.toggle('error', Boolean(isError));
}

function addTurn(question, answer, sourcePage) {
  const user = document.createElement('div');
  user.className = 'turn user';
  user.textContent = question;
  chatEl.appendChild(user);

  const bot = document.createElement('div');
  bot.className = 'turn bot';
  bot.textContent = answer;
  const ref = document.createElement('span');
  ref.className = 'page-ref';
  ref.textContent = 'Source: page ' + sourcePage;
  bot.appendChild(ref);
  chatEl.appendChild(bot);
  chatEl.scrollTop = chatEl.scrollHeight;
}

async function readError(response) {
  try {
    const body = await response.json();
    if (body && body.error) return body.error;
  } catch (ignored) {}
  return 'Request failed (' + response.status + ')';
}

async function refresh() {
  try {
    const response = await fetch('/session');
    if (!response.ok) return;
    const snapshot = await response.json();
    if (snapshot.document) {
      pageCount = snapshot.document.page_count;
      setStatus(snapshot.document.name + ' - ' + snapshot.document.page_count
        + ' pages, ' + snapshot.document.passages_indexed + ' passages indexed.');
    }
    for (const turn of snapshot.history) {
      addTurn(turn.question, turn.answer, turn.source_page);
    }
  } catch (ignored) {}
}

async function processUpload() {
  const input = document.getElementById('pdf-input');
  if (!input.files || input.files.length === 0) {
    setStatus('Choose a PDF first.', true);
    return;
  }
  const form = new FormData();
  form.append('file', input.files[0]);
  processBtn.disabled = true;
  setStatus('Processing...');
  try {
    const response = await fetch('/document', { method: 'POST', body: form });
    if (!response.ok) {
      setStatus(await readError(response), true);
      return;
    }
    const outcome = await response.json();
    pageCount = outcome.page_count;
    chatEl.replaceChildren();
    viewerEl.hidden = true;
    viewerEl.removeAttribute('src');
    placeholderEl.hidden = false;
    captionEl.textContent = 'Answer sources appear here.';
    setStatus(outcome.name + ' - ' + outcome.page_count + ' pages, '
      + outcome.passages_indexed + ' passages indexed. Ask away.');
  } catch (error) {
    setStatus('Upload failed: ' + error, true);
  } finally {
    processBtn.disabled = false;
  }
}

async function ask() {
  const question = questionEl.value.trim();
  if (!question) return;
  askBtn.disabled = true;
  try {
    const response = await fetch('/question', {
      method: 'POST',
      headers: { 'Content-Type': 'application/json' },
      body: JSON.stringify({ question })
    });
    if (!response.ok) {
      setStatus(await readError(response), true);
      return;
    }
    const outcome = await response.json();
    questionEl.value = '';
    addTurn(question, outcome.answer, outcome.source_page);
    viewerEl.src = 'data:application/pdf;base64,' + outcome.excerpt_base64
      + '#page=' + outcome.focus_page;
    viewerEl.hidden = false;
    placeholderEl.hidden = true;
    captionEl.textContent = 'Pages ' + outcome.window.first_page + '-'
      + outcome.window.last_page + ' of ' + pageCount
      + ' (answer from page ' + outcome.source_page + ')';
    setStatus('');
  } catch (error) {
    setStatus('Question failed: ' + error, true);
  } finally {
    askBtn.disabled = false;
  }
}

processBtn.addEventListener('click', processUpload);
askBtn.addEventListener('click', ask);
questionEl.addEventListener('keydown', (event) => {
  if (event.key === 'Enter') ask();
});
refresh();
</script>
</body>
</html>
"##;
