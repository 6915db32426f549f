use std::rc::Rc;
use adom::Platform;
use anyhow::Result;

use crate::{html::Html, template::TemplateCache, value::Value};

/// Entry point: creates template instances for a platform, sharing one
/// template cache.
#[derive(Clone)]
pub struct Markup {
    platform: Rc<dyn Platform>,
    cache: Rc<TemplateCache>,
}

impl Markup {
    pub fn new(platform: Rc<dyn Platform>) -> Markup {
        Markup::with_cache(platform, Rc::new(TemplateCache::new()))
    }

    pub fn with_cache(platform: Rc<dyn Platform>, cache: Rc<TemplateCache>) -> Markup {
        Markup { platform, cache }
    }

    /// Instance of the template made of the literal `segments` with
    /// `values` in the gaps between them (one less value than
    /// segments). Use the `html!` macro for the tagged-template form.
    pub fn html(&self, segments: &[&str], values: Vec<Value>) -> Result<Html> {
        let template = self.cache.get_or_compile(&*self.platform, segments, &values)?;
        Html::new(self.platform.clone(), template, values)
    }

    pub fn cache(&self) -> &TemplateCache {
        &self.cache
    }

    pub fn platform(&self) -> &Rc<dyn Platform> {
        &self.platform
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use adom::{Document, Node};

    #[test]
    fn t_instances_share_compiled_template() {
        let doc = Rc::new(Document::new());
        let m = Markup::new(doc.clone());
        let a = html!(m, "<p>", 1, "</p>").unwrap();
        let b = html!(m, "<p>", "two", "</p>").unwrap();
        assert_eq!(m.cache().compile_count(), 1);
        a.render(doc.body()).unwrap();
        b.render(doc.body()).unwrap();
        assert_eq!(doc.body().inner_html(), "<p>1</p><p>two</p>");
        assert!(!Node::ptr_eq(&a.nodes()[0], &b.nodes()[0]));

        let shared = Markup::with_cache(doc.clone(), Rc::new(TemplateCache::new()));
        let other = shared.clone();
        shared.html(&["<i>", "</i>"], vec![Value::Null]).unwrap();
        other.html(&["<i>", "</i>"], vec![Value::from(3)]).unwrap();
        assert_eq!(other.cache().compile_count(), 1);
        assert_eq!(m.cache().len(), 1);
    }
}
