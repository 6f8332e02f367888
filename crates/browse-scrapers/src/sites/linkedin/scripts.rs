use crate::script::Script;

pub(super) const PROFILE_MARKER: &str = ".pv-top-card";
pub(super) const POST_MARKER: &str = ".feed-shared-update-v2";
pub(super) const SEARCH_MARKER: &str =
    ".reusable-search__result-container, .update-components-text";

pub(super) const PROFILE: Script = Script::new(
    "linkedin-profile",
    r#"(args) => {
        const text = (scope, sel) => {
            const el = scope.querySelector(sel);
            return el ? el.textContent.trim() : null;
        };
        const card = document.querySelector('.pv-top-card');
        const avatar = document.querySelector('.pv-top-card img.pv-top-card-profile-picture__image');

        const experience = Array.from(document.querySelectorAll(
            '#experience ~ .pvs-list__outer-container li.artdeco-list__item'
        )).slice(0, args.maxExperience).map((li) => {
            const companyLink = li.querySelector('a[href*="/company/"]');
            return {
                title: text(li, '.mr1 .visually-hidden') || '',
                company: text(li, '.t-14.t-normal span[aria-hidden="true"]') || '',
                companyUrl: companyLink ? companyLink.href : null,
                duration: text(li, '.pvs-entity__caption-wrapper') || '',
                description: text(li, '.inline-show-more-text'),
            };
        });

        const education = Array.from(document.querySelectorAll(
            '#education ~ .pvs-list__outer-container li.artdeco-list__item'
        )).slice(0, args.maxEducation).map((li) => ({
            school: text(li, '.mr1 .visually-hidden') || '',
            degree: text(li, '.t-14.t-normal span[aria-hidden="true"]'),
            dates: text(li, '.pvs-entity__caption-wrapper'),
        }));

        const skills = Array.from(document.querySelectorAll(
            '#skills ~ .pvs-list__outer-container .hoverable-link-text span[aria-hidden="true"]'
        )).map((s) => s.textContent.trim()).filter(Boolean).slice(0, args.maxSkills);

        return {
            name: card ? (text(card, 'h1') || '') : '',
            headline: card ? (text(card, '.text-body-medium') || '') : '',
            location: card ? text(card, '.pb2 .text-body-small') : null,
            about: text(document, '#about + .display-flex .inline-show-more-text'),
            profileImageUrl: avatar ? avatar.src : null,
            connections: card ? text(card, '.pv-top-card--list-bullet li:first-child span') : null,
            experience,
            education,
            skills,
        };
    }"#,
);

pub(super) const POSTS: Script = Script::new(
    "linkedin-posts",
    r#"() => Array.from(document.querySelectorAll('.feed-shared-update-v2')).map((post) => {
        const text = (sel) => {
            const el = post.querySelector(sel);
            return el ? el.textContent.trim() : null;
        };
        const authorLink = post.querySelector('.update-components-actor__container-link');
        const authorImage = post.querySelector('.update-components-actor__image img');
        return {
            urn: post.getAttribute('data-urn'),
            authorName: text('.update-components-actor__name span[aria-hidden="true"]') || '',
            authorHeadline: text('.update-components-actor__description'),
            authorUrl: authorLink ? authorLink.href : null,
            authorImage: authorImage ? authorImage.src : null,
            text: text('.feed-shared-update-v2__description .break-words') || '',
            images: Array.from(post.querySelectorAll('.feed-shared-image__image'))
                .map((img) => img.src).filter(Boolean),
            reactions: text('.social-details-social-counts__reactions-count') || '',
            comments: text('.social-details-social-counts__comments') || '',
            reposts: text('.social-details-social-counts__reposts') || '',
            posted: text('.update-components-actor__sub-description span[aria-hidden="true"]'),
        };
    })"#,
);

pub(super) const SEARCH: Script = Script::new(
    "linkedin-search",
    r#"(args) => {
        if (args.kind === 'posts') {
            return Array.from(document.querySelectorAll('.update-components-text')).map((el) => {
                const container = el.closest('.feed-shared-update-v2, li') || el.parentElement;
                const name = container ? container.querySelector('.update-components-actor__name') : null;
                const link = container ? container.querySelector('a[href*="/feed/update/"]') : null;
                return {
                    title: name ? name.textContent.trim() : '',
                    text: el.textContent.trim(),
                    href: link ? link.href : null,
                };
            });
        }
        return Array.from(document.querySelectorAll('.reusable-search__result-container')).map((item) => {
            const text = (sel) => {
                const el = item.querySelector(sel);
                return el ? el.textContent.trim() : null;
            };
            const link = item.querySelector('.entity-result__title-text a');
            return {
                title: text('.entity-result__title-text a span[aria-hidden="true"]') || '',
                primary: text('.entity-result__primary-subtitle'),
                secondary: text('.entity-result__secondary-subtitle'),
                href: link ? link.href : null,
                badge: text('.entity-result__badge-text'),
            };
        });
    }"#,
);

pub(super) const NEXT_PAGE: Script = Script::new(
    "linkedin-next",
    r#"() => {
        const next = document.querySelector('button[aria-label="Next"]');
        if (!next || next.disabled) return false;
        next.click();
        return true;
    }"#,
);
