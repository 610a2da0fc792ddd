use crate::models::compute_hash;

/// Deterministic listing identity for one platform.
///
/// Ids have the form `{platform-slug}-{16 hex chars}` where the hex part is
/// a SHA-256 prefix over the platform name and the source-native id, so the
/// same listing always maps to the same id and two platforms never share
/// one even when their native ids coincide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdGenerator {
    platform: String,
    slug: String,
}

impl IdGenerator {
    pub fn new(platform: impl Into<String>) -> Self {
        let platform = platform.into();
        let slug = slugify(&platform);
        Self { platform, slug }
    }

    pub fn platform(&self) -> &str {
        &self.platform
    }

    pub fn generate(&self, source_native_id: &str) -> String {
        let digest = compute_hash(&format!(
            "{}\u{1f}{}",
            self.platform,
            source_native_id.trim()
        ));
        format!("{}-{}", self.slug, &digest[..16])
    }
}

fn slugify(platform: &str) -> String {
    let mut slug = String::with_capacity(platform.len());
    for c in platform.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.ends_with('_') && !slug.is_empty() {
            slug.push('_');
        }
    }
    let slug = slug.trim_end_matches('_');
    if slug.is_empty() {
        "src".to_string()
    } else {
        slug.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_input_same_id() {
        let generator = IdGenerator::new("Djinni");
        assert_eq!(generator.generate("12345"), generator.generate("12345"));
        assert_eq!(
            IdGenerator::new("Djinni").generate("12345"),
            generator.generate("12345")
        );
    }

    #[test]
    fn platforms_never_collide() {
        let a = IdGenerator::new("Djinni").generate("12345");
        let b = IdGenerator::new("DOU").generate("12345");
        assert_ne!(a, b);
        assert!(a.starts_with("djinni-"));
        assert!(b.starts_with("dou-"));
    }

    #[test]
    fn native_ids_differ() {
        let generator = IdGenerator::new("Lever");
        assert_ne!(generator.generate("a"), generator.generate("b"));
    }

    #[test]
    fn slug_shape() {
        assert_eq!(slugify("We Work Remotely"), "we_work_remotely");
        assert_eq!(slugify("  !!"), "src");
        let id = IdGenerator::new("We Work Remotely").generate("x");
        assert_eq!(id.len(), "we_work_remotely-".len() + 16);
    }
}
