//! Embedded static assets.

pub const CSS: &str = r#"
:root {
    --bg: #f5f6f8;
    --panel: #ffffff;
    --text: #1f2933;
    --muted: #616e7c;
    --accent: #1d4ed8;
    --accent-dark: #1e3a8a;
    --border: #d9dee5;
    --success: #166534;
    --error: #b91c1c;
    --info: #1e40af;
}

* { box-sizing: border-box; }

body {
    margin: 0;
    font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif;
    background: var(--bg);
    color: var(--text);
    line-height: 1.5;
}

a { color: var(--accent); text-decoration: none; }
a:hover { text-decoration: underline; }

header.site {
    background: var(--accent-dark);
    color: #fff;
    padding: 0.75rem 1.5rem;
    display: flex;
    align-items: center;
    justify-content: space-between;
    gap: 1rem;
}
header.site a { color: #fff; }
header.site .brand { font-weight: 700; font-size: 1.15rem; }
header.site form { display: flex; gap: 0.5rem; }
header.site nav a { margin-left: 1rem; }

main { max-width: 1100px; margin: 1.5rem auto; padding: 0 1rem; }

.flash { padding: 0.6rem 1rem; border-radius: 4px; margin-bottom: 0.75rem; }
.flash-success { background: #dcfce7; color: var(--success); }
.flash-error { background: #fee2e2; color: var(--error); }
.flash-info { background: #dbeafe; color: var(--info); }

.stats { display: flex; gap: 1rem; margin: 1rem 0; flex-wrap: wrap; }
.stat { background: var(--panel); border: 1px solid var(--border); border-radius: 6px; padding: 0.75rem 1.25rem; }
.stat .value { font-size: 1.5rem; font-weight: 700; }
.stat .label { color: var(--muted); font-size: 0.85rem; }

.grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(240px, 1fr)); gap: 1rem; }
.card { background: var(--panel); border: 1px solid var(--border); border-radius: 6px; padding: 1rem; }
.card img { width: 100%; border-radius: 4px; }
.card h3 { margin: 0.25rem 0; }
.muted { color: var(--muted); }

.slider { display: flex; gap: 1rem; overflow-x: auto; margin-bottom: 1.5rem; }
.slide { min-width: 320px; position: relative; border-radius: 6px; overflow: hidden; }
.slide img { width: 100%; height: 180px; object-fit: cover; display: block; }
.slide .caption { position: absolute; bottom: 0; left: 0; right: 0; padding: 0.5rem 0.75rem; background: rgba(0,0,0,0.55); color: #fff; }

table { width: 100%; border-collapse: collapse; background: var(--panel); }
th, td { padding: 0.5rem 0.75rem; border-bottom: 1px solid var(--border); text-align: left; }
th { background: #eef1f5; font-weight: 600; }
td.actions { white-space: nowrap; }
td.actions form { display: inline; }

form.stacked label { display: block; margin-top: 0.75rem; font-weight: 600; }
form.stacked input[type=text], form.stacked input[type=password], form.stacked input[type=number],
form.stacked input[type=url], form.stacked textarea, form.stacked select {
    width: 100%; padding: 0.45rem; border: 1px solid var(--border); border-radius: 4px; font: inherit;
}
form.stacked textarea { min-height: 6rem; }
.field-error { color: var(--error); font-size: 0.85rem; }

button, .button {
    display: inline-block; background: var(--accent); color: #fff; border: none; border-radius: 4px;
    padding: 0.45rem 0.9rem; cursor: pointer; font: inherit;
}
button.danger { background: var(--error); }
.button.secondary { background: var(--muted); }

dl.specs { display: grid; grid-template-columns: max-content 1fr; gap: 0.35rem 1rem; }
dl.specs dt { font-weight: 600; }
dl.specs dd { margin: 0; }

iframe.pdf { width: 100%; height: 720px; border: 1px solid var(--border); border-radius: 4px; }

footer { text-align: center; color: var(--muted); font-size: 0.85rem; padding: 2rem 0; }
"#;
