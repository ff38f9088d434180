//! The chat page. Static HTML and script; all state lives behind the JSON API.

pub const CHAT_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Ivy Chatbot</title>
<style>
  body { font-family: system-ui, sans-serif; max-width: 860px; margin: 2rem auto; padding: 0 1rem; color: #222; }
  h1 { margin-bottom: 1rem; }
  details { border: 1px solid #ccc; border-radius: 6px; padding: .5rem 1rem; margin-bottom: 1rem; }
  fieldset { border: 1px solid #ddd; border-radius: 4px; margin: .5rem 0; }
  label { display: block; margin: .4rem 0; }
  input[type=text], input[type=password], textarea { width: 100%; box-sizing: border-box; padding: .4rem; }
  #transcript { border: 1px solid #ccc; border-radius: 6px; min-height: 240px; padding: .5rem; overflow-y: auto; max-height: 60vh; }
  #transcript .empty { color: #888; }
  .turn { margin: .6rem 0; }
  .q { background: #eef3ff; padding: .4rem .6rem; border-radius: 6px; white-space: pre-wrap; }
  .a { background: #f4f4f4; padding: .4rem .6rem; border-radius: 6px; white-space: pre-wrap; margin-top: .3rem; }
  .reactions button { font-size: .8rem; margin-right: .3rem; }
  .reactions .active { font-weight: bold; }
  .error { color: #b00020; }
  .row { display: flex; gap: .5rem; margin: .5rem 0; }
  #notice { min-height: 1.2rem; color: #2a7; }
</style>
</head>
<body>
<h1>Ivy Chatbot</h1>

<details id="settings">
  <summary>Settings</summary>
  <fieldset>
    <legend>MCM Settings</legend>
    <label>MCM URL <input id="mcm-url" type="text"></label>
    <label>MCM API Key <input id="mcm-api-key" type="password"></label>
  </fieldset>
  <fieldset>
    <legend>General Settings</legend>
    <label>Timeout (seconds): <span id="timeout-value"></span>
      <input id="timeout" type="range">
    </label>
  </fieldset>
</details>

<label>Your Conversation</label>
<div id="transcript"><div class="empty">Your conversations will appear here...</div></div>

<label>Question
  <textarea id="question" rows="3" placeholder="Please enter your question here..."></textarea>
</label>
<div class="row">
  <button id="submit">Submit</button>
  <button id="clear">Clear</button>
</div>
<div class="row">
  <button id="flag">Flag last response</button>
  <button id="download">Download Flagged Responses</button>
</div>
<div id="notice"></div>

<script>
(function () {
  const $ = (id) => document.getElementById(id);
  const identity = { username: null, session_id: null };
  let turns = [];

  function headers(json) {
    const h = {};
    if (json) h["content-type"] = "application/json";
    if (identity.username) h["x-ivy-username"] = identity.username;
    if (identity.session_id) h["x-ivy-session"] = identity.session_id;
    return h;
  }

  function settings() {
    return {
      mcm_url: $("mcm-url").value,
      api_key: $("mcm-api-key").value,
      timeout_secs: Number($("timeout").value),
    };
  }

  function notice(text, isError) {
    const n = $("notice");
    n.textContent = text;
    n.className = isError ? "error" : "";
    if (!isError) setTimeout(() => { if (n.textContent === text) n.textContent = ""; }, 2500);
  }

  function render() {
    const t = $("transcript");
    t.innerHTML = "";
    if (turns.length === 0) {
      t.innerHTML = '<div class="empty">Your conversations will appear here...</div>';
      return;
    }
    turns.forEach((turn, i) => {
      const div = document.createElement("div");
      div.className = "turn";
      const q = document.createElement("div");
      q.className = "q";
      q.textContent = turn.question;
      const a = document.createElement("div");
      a.className = "a";
      a.textContent = turn.response;
      div.append(q, a);
      if (!turn.pending) {
        const r = document.createElement("div");
        r.className = "reactions";
        [["liked", "\u{1F44D}"], ["disliked", "\u{1F44E}"]].forEach(([reaction, icon]) => {
          const b = document.createElement("button");
          b.textContent = icon;
          if (turn.reaction === reaction) b.className = "active";
          b.onclick = () => react(i, reaction);
          r.append(b);
        });
        div.append(r);
      }
      t.append(div);
    });
    t.scrollTop = t.scrollHeight;
  }

  async function react(index, reaction) {
    const turn = turns[index];
    if (!turn) return;
    const res = await fetch("/api/react", {
      method: "POST",
      headers: headers(true),
      body: JSON.stringify({
        turn_id: turn.turn_id || null,
        question: turn.question,
        response: turn.response,
        reaction,
      }),
    });
    if (!res.ok) {
      const err = await res.json().catch(() => ({ message: res.statusText }));
      notice(err.message, true);
      return;
    }
    const body = await res.json();
    turns[index] = body.turn;
    render();
    notice("Saved successfully!");
  }

  async function submit() {
    const question = $("question").value;
    if (!question.trim()) return;
    $("question").value = "";
    const pending = { question, response: "", pending: true };
    turns.push(pending);
    render();

    const res = await fetch("/api/chat/stream", {
      method: "POST",
      headers: headers(true),
      body: JSON.stringify({ question, settings: settings() }),
    });
    if (!res.ok) {
      turns.pop();
      render();
      const err = await res.json().catch(() => ({ message: res.statusText }));
      notice(err.message, true);
      return;
    }

    const reader = res.body.getReader();
    const decoder = new TextDecoder();
    let buffer = "";
    for (;;) {
      const { value, done } = await reader.read();
      if (done) break;
      buffer += decoder.decode(value, { stream: true });
      let cut;
      while ((cut = buffer.indexOf("\n\n")) >= 0) {
        const raw = buffer.slice(0, cut);
        buffer = buffer.slice(cut + 2);
        let event = "message";
        const data = [];
        raw.split("\n").forEach((line) => {
          if (line.startsWith("event:")) event = line.slice(6).trim();
          else if (line.startsWith("data:")) data.push(line.slice(5).replace(/^ /, ""));
        });
        const text = data.join("\n");
        if (event === "typing") {
          pending.response = text;
          render();
        } else if (event === "turn") {
          turns[turns.indexOf(pending)] = JSON.parse(text);
          render();
        } else if (event === "error") {
          turns.splice(turns.indexOf(pending), 1);
          render();
          notice(JSON.parse(text).message, true);
        }
      }
    }
  }

  function flagLast() {
    for (let i = turns.length - 1; i >= 0; i--) {
      if (!turns[i].pending) return react(i, "flagged");
    }
    notice("Nothing to flag yet", true);
  }

  async function download() {
    const res = await fetch("/api/export", { headers: headers(false) });
    if (res.status === 204) {
      notice("No flagged responses to download", true);
      return;
    }
    if (!res.ok) {
      const err = await res.json().catch(() => ({ message: res.statusText }));
      notice(err.message, true);
      return;
    }
    const disposition = res.headers.get("content-disposition") || "";
    const match = disposition.match(/filename="([^"]+)"/);
    const url = URL.createObjectURL(await res.blob());
    const a = document.createElement("a");
    a.href = url;
    a.download = match ? match[1] : "flagged.csv";
    a.click();
    URL.revokeObjectURL(url);
  }

  async function init() {
    const res = await fetch("/api/settings", { headers: headers(false) });
    const body = await res.json();
    identity.username = body.username;
    identity.session_id = body.session_id;
    $("mcm-url").value = body.settings.mcm_url;
    $("mcm-api-key").value = body.settings.api_key;
    const t = $("timeout");
    t.min = body.timeout_range.min;
    t.max = body.timeout_range.max;
    t.step = body.timeout_range.step;
    t.value = body.settings.timeout_secs;
    $("timeout-value").textContent = t.value;
    t.oninput = () => { $("timeout-value").textContent = t.value; };

    const hist = await fetch("/api/history", { headers: headers(false) });
    if (hist.ok) {
      turns = (await hist.json()).turns;
      render();
    }
  }

  $("submit").onclick = submit;
  $("question").addEventListener("keydown", (e) => {
    if (e.key === "Enter" && !e.shiftKey) { e.preventDefault(); submit(); }
  });
  $("clear").onclick = () => { turns = []; render(); };
  $("flag").onclick = flagLast;
  $("download").onclick = download;
  init();
})();
</script>
</body>
</html>
"##;
