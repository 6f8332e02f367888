use crate::script::Script;

pub(super) const PROFILE_MARKER: &str = r#"[data-testid="UserName"]"#;
pub(super) const TWEET_MARKER: &str = r#"article[data-testid="tweet"]"#;

pub(super) const PROFILE: Script = Script::new(
    "twitter-profile",
    r#"() => {
        const text = (sel) => {
            const el = document.querySelector(sel);
            return el ? el.textContent.trim() : null;
        };
        const statLink = (suffix) => {
            const a = document.querySelector(`a[href$="/${suffix}"]`);
            return a ? a.textContent.trim() : '';
        };
        const nameBlock = document.querySelector('[data-testid="UserName"]');
        const nameSpan = nameBlock ? nameBlock.querySelector('span') : null;
        const website = document.querySelector('[data-testid="UserUrl"]');
        const joined = text('[data-testid="UserJoinDate"]');
        const avatar = document.querySelector('a[href$="/photo"] img');
        const banner = document.querySelector('a[href$="/header_photo"] img');
        // The post count sits in the sticky header above the profile.
        const header = document.querySelector('[data-testid="primaryColumn"] h2');
        const postsLine = header && header.parentElement
            ? Array.from(header.parentElement.querySelectorAll('div'))
                .map((d) => d.textContent.trim())
                .find((t) => /\b(posts|tweets)$/i.test(t))
            : null;

        return {
            displayName: nameSpan ? nameSpan.textContent.trim() : '',
            bio: text('[data-testid="UserDescription"]') || '',
            location: text('[data-testid="UserLocation"]'),
            website: website ? (website.getAttribute('href') || website.textContent.trim()) : null,
            joinDate: joined ? joined.replace(/^Joined\s+/i, '') : null,
            followers: statLink('verified_followers') || statLink('followers'),
            following: statLink('following'),
            posts: postsLine || '',
            verified: !!(nameBlock && nameBlock.querySelector('[data-testid="icon-verified"]')),
            protected: !!(nameBlock && nameBlock.querySelector('[data-testid="icon-lock"]')),
            profileImageUrl: avatar ? avatar.src : null,
            bannerImageUrl: banner ? banner.src : null,
        };
    }"#,
);

pub(super) const TWEETS: Script = Script::new(
    "twitter-tweets",
    r#"() => {
        const STATUS = /\/([A-Za-z0-9_]+)\/status\/(\d+)/;
        const count = (article, id) => {
            const button = article.querySelector(`[data-testid="${id}"]`);
            return button ? button.textContent.trim() : '';
        };
        const author = (scope) => {
            const block = scope.querySelector('[data-testid="User-Name"]');
            if (!block) return { handle: '', name: '', avatar: null, verified: false };
            const link = Array.from(block.querySelectorAll('a[href^="/"]'))
                .find((a) => !a.getAttribute('href').includes('/status/'));
            const nameSpan = block.querySelector('span');
            const avatar = scope.querySelector('[data-testid="Tweet-User-Avatar"] img');
            const handleText = Array.from(block.querySelectorAll('span'))
                .map((s) => s.textContent.trim())
                .find((t) => t.startsWith('@'));
            return {
                handle: link
                    ? link.getAttribute('href').replace(/^\//, '').split('/')[0]
                    : (handleText || '').replace(/^@/, ''),
                name: nameSpan ? nameSpan.textContent.trim() : '',
                avatar: avatar ? avatar.src : null,
                verified: !!block.querySelector('[data-testid="icon-verified"]'),
            };
        };
        const hasButton = (scope, label) => Array.from(
            scope.querySelectorAll('button, [role="button"], a, span')
        ).some((el) => el.children.length === 0 && el.textContent.trim() === label);

        return Array.from(document.querySelectorAll('article[data-testid="tweet"]')).map((article) => {
            const quoteBox = Array.from(article.querySelectorAll('div[role="link"]'))
                .find((d) => d.querySelector('[data-testid="User-Name"]'));
            const inQuote = (el) => !!(quoteBox && quoteBox.contains(el));

            const textEl = Array.from(article.querySelectorAll('[data-testid="tweetText"]'))
                .find((el) => !inQuote(el));
            const time = Array.from(article.querySelectorAll('time')).find((t) => !inQuote(t));
            const permalink = time ? time.closest('a') : null;
            const match = permalink ? (permalink.getAttribute('href') || '').match(STATUS) : null;

            const media = [];
            for (const img of article.querySelectorAll('[data-testid="tweetPhoto"] img')) {
                if (!inQuote(img)) media.push({ type: 'image', url: img.src });
            }
            for (const video of article.querySelectorAll('video')) {
                if (inQuote(video)) continue;
                const gif = !!video.closest('[data-testid="tweetGif"]');
                media.push({
                    type: gif ? 'gif' : 'video',
                    url: video.currentSrc || video.src || video.poster || '',
                    thumbnailUrl: video.poster || null,
                });
            }

            let quoted = null;
            if (quoteBox) {
                const qText = quoteBox.querySelector('[data-testid="tweetText"]');
                const qLink = quoteBox.querySelector('a[href*="/status/"]');
                const qMatch = qLink ? (qLink.getAttribute('href') || '').match(STATUS) : null;
                quoted = {
                    id: qMatch ? qMatch[2] : null,
                    url: qMatch ? `https://x.com${qMatch[0]}` : null,
                    text: qText ? qText.innerText : '',
                    author: author(quoteBox),
                };
            }

            const social = article.querySelector('[data-testid="socialContext"]');
            const replyLine = Array.from(article.querySelectorAll('div'))
                .find((d) => !inQuote(d) && /^Replying to\b/.test(d.textContent.trim())
                    && d.textContent.trim().length < 200);
            const views = article.querySelector('a[href$="/analytics"]');

            return {
                id: match ? match[2] : null,
                url: match ? `https://x.com${match[0]}` : null,
                text: textEl ? textEl.innerText : '',
                author: author(article),
                datetime: time ? time.getAttribute('datetime') : null,
                timeText: time ? time.textContent.trim() : null,
                replies: count(article, 'reply'),
                retweets: count(article, 'retweet') || count(article, 'unretweet'),
                likes: count(article, 'like') || count(article, 'unlike'),
                views: views ? views.textContent.trim() : '',
                media,
                quoted,
                markers: {
                    socialContext: social ? social.textContent.trim() : null,
                    replyingTo: replyLine ? replyLine.textContent.trim() : null,
                    showThreadLink: hasButton(article, 'Show this thread'),
                    largeDetailCard: !!article.querySelector('[data-testid="card.layoutLarge.detail"]'),
                    showMore: !!article.querySelector('[data-testid="tweet-text-show-more-link"]')
                        || hasButton(article, 'Show more'),
                },
            };
        });
    }"#,
);
