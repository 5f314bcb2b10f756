/// Browser side of the listing's "load more" button.
///
/// Same rules as the server-side feed loader: the button is disabled while
/// a fetch is outstanding, pages are appended in order, the cursor is
/// replaced only after a successful fetch, and a failed fetch leaves the
/// list untouched and the button enabled for a retry.
pub fn generate_feed_js() -> &'static str {
    r#"// Incremental post feed
(function () {
    const MONTHS = ['jan', 'fev', 'mar', 'abr', 'mai', 'jun', 'jul', 'ago', 'set', 'out', 'nov', 'dez'];

    function formatDate(raw) {
        if (!raw) return '';
        const normalized = raw.replace(/([+-]\d{2})(\d{2})$/, '$1:$2');
        const date = new Date(normalized);
        if (isNaN(date.getTime())) return '';
        const day = String(date.getUTCDate()).padStart(2, '0');
        return day + ' ' + MONTHS[date.getUTCMonth()] + ' ' + date.getUTCFullYear();
    }

    function text(value) {
        if (typeof value === 'string') return value;
        if (Array.isArray(value)) return value.map(b => (b && b.text) || '').join(' ');
        return '';
    }

    function card(doc) {
        const data = doc.data || {};
        const link = document.createElement('a');
        link.href = '/post/' + encodeURIComponent(doc.uid);

        const title = document.createElement('strong');
        title.textContent = text(data.title);
        const subtitle = document.createElement('p');
        subtitle.textContent = text(data.subtitle);

        const info = document.createElement('div');
        info.className = 'post-info';
        const time = document.createElement('time');
        time.textContent = formatDate(doc.first_publication_date);
        const author = document.createElement('span');
        author.textContent = text(data.author);
        info.append(time, author);

        link.append(title, subtitle, info);
        return link;
    }

    document.addEventListener('DOMContentLoaded', () => {
        const button = document.querySelector('.load-more[data-next-page]');
        const list = document.querySelector('.posts');
        if (!button || !list) return;

        button.addEventListener('click', async () => {
            const cursor = button.dataset.nextPage;
            if (!cursor || button.disabled) return;

            button.disabled = true;
            try {
                const response = await fetch(cursor);
                if (!response.ok) throw new Error('HTTP ' + response.status);
                const page = await response.json();

                (page.results || [])
                    .filter(doc => doc && doc.uid)
                    .forEach(doc => list.appendChild(card(doc)));

                if (page.next_page) {
                    button.dataset.nextPage = page.next_page;
                    button.disabled = false;
                } else {
                    button.remove();
                }
            } catch (err) {
                console.error('Failed to load more posts:', err);
                button.disabled = false;
            }
        });
    });
})();
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_targets_listing_markup() {
        let js = generate_feed_js();
        assert!(js.contains(".load-more[data-next-page]"));
        assert!(js.contains("button.disabled = true"));
        assert!(js.contains("'fev'"));
    }
}
