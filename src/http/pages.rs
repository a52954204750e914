//! Static pages served by the portal and control surfaces.

const SSID_MARKER: &str = "{{AP_SSID}}";

const SETUP_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Pixie Setup</title>
<style>
body { font-family: sans-serif; max-width: 28em; margin: 1em auto; padding: 0 1em; }
li { padding: .4em 0; cursor: pointer; }
#msg { min-height: 1.5em; }
</style>
</head>
<body>
<h1>Pixie Setup</h1>
<p>Connected to <b>{{AP_SSID}}</b>. Pick your WiFi network.</p>
<button onclick="scan()">Scan</button>
<ul id="nets"></ul>
<form onsubmit="join(event)">
<input id="ssid" placeholder="Network name" required>
<input id="pw" type="password" placeholder="Password">
<button type="submit">Connect</button>
</form>
<p id="msg"></p>
<script>
async function scan() {
  const r = await fetch('/api/scan');
  const { networks } = await r.json();
  const ul = document.getElementById('nets');
  ul.innerHTML = '';
  for (const n of networks) {
    const li = document.createElement('li');
    li.textContent = `${n.ssid} (${n.signal}%)${n.secure ? ' 🔒' : ''}`;
    li.onclick = () => { document.getElementById('ssid').value = n.ssid; };
    ul.appendChild(li);
  }
}
async function join(e) {
  e.preventDefault();
  const msg = document.getElementById('msg');
  msg.textContent = 'Connecting...';
  const body = JSON.stringify({
    ssid: document.getElementById('ssid').value,
    password: document.getElementById('pw').value,
  });
  const r = await fetch('/api/connect', { method: 'POST', headers: { 'Content-Type': 'application/json' }, body });
  const res = await r.json();
  msg.textContent = res.success ? `Connected! Device address: ${res.message}` : res.message;
}
scan();
</script>
</body>
</html>
"#;

/// Remote control page for the control surface.
pub const REMOTE_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Pixie Remote</title>
<style>
body { font-family: sans-serif; max-width: 28em; margin: 1em auto; padding: 0 1em; }
button { display: block; width: 100%; margin: .4em 0; padding: .8em; }
.active { font-weight: bold; }
#screen { display: none; width: 100%; image-rendering: pixelated; background: #000; }
</style>
</head>
<body>
<h1>Pixie</h1>
<canvas id="screen"></canvas>
<div id="apps"></div>
<script>
const view = document.getElementById('screen');
async function pollFrame() {
  const r = await fetch('/api/frame');
  if (!r.ok) return;
  const { width, height, pixels } = await r.json();
  if (width > 0) {
    view.width = width;
    view.height = height;
    const ctx = view.getContext('2d');
    const img = ctx.createImageData(width, height);
    pixels.forEach(([red, green, blue], i) => {
      img.data.set([red, green, blue, 255], i * 4);
    });
    ctx.putImageData(img, 0, 0);
    view.style.display = 'block';
  }
  setTimeout(pollFrame, 100);
}
async function refresh() {
  const r = await fetch('/api/status');
  const { currentApp, availableApps } = await r.json();
  const div = document.getElementById('apps');
  div.innerHTML = '';
  for (const name of availableApps) {
    const b = document.createElement('button');
    b.textContent = name;
    if (name === currentApp) b.className = 'active';
    b.onclick = async () => {
      await fetch('/api/switch', { method: 'POST', headers: { 'Content-Type': 'application/json' }, body: JSON.stringify({ app: name }) });
      refresh();
    };
    div.appendChild(b);
  }
}
refresh();
pollFrame();
</script>
</body>
</html>
"#;

/// Setup page with the hotspot name filled in.
pub fn setup_page(ap_ssid: &str) -> String {
    SETUP_TEMPLATE.replace(SSID_MARKER, &escape_html(ap_ssid))
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
