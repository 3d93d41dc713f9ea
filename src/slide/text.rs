//! Shape text and style mutation.

use super::{Result, SlideDoc, SlideError};
use crate::xml::NodeId;
use tracing::warn;

impl SlideDoc {
    /// Set the text of an indexed shape by title. A missing shape logs a
    /// warning and is skipped — data fills degrade gracefully, unlike
    /// structural lookups.
    pub fn set_text(&mut self, title: &str, text: &str) -> Result<()> {
        let Some(shape) = self.shape(title) else {
            warn!(title, "tried to set text, but the shape wasn't found");
            return Ok(());
        };
        self.set_element_text(shape, text)
    }

    /// Replace a shape's text: the first run gets the new content and
    /// any further runs are removed so stale text never survives.
    /// Destructive — the dropped runs cannot be recovered within the
    /// same pass.
    pub fn set_element_text(&mut self, node: NodeId, text: &str) -> Result<()> {
        let runs = self.doc().find_descendants(node, "a:t");
        let (&first, rest) = runs.split_first().ok_or(SlideError::NoTextRun)?;

        let content = if self.fill_empty() { "" } else { text };
        self.doc_mut().set_text(first, content);

        for &t in rest {
            if let Some(run) = self.doc().parent(t) {
                self.doc_mut().detach(run);
            }
        }
        Ok(())
    }

    /// Replace a shape's paragraph set with one paragraph per line, each
    /// cloned from the first existing paragraph's formatting.
    pub fn set_element_text_lines<S: AsRef<str>>(&mut self, node: NodeId, lines: &[S]) -> Result<()> {
        let tx_body = self
            .doc()
            .find_descendant(node, "p:txBody")
            .ok_or(SlideError::MissingNode("p:txBody"))?;

        let paragraphs = self.doc().find_descendants(tx_body, "a:p");
        let (&first, _) = paragraphs.split_first().ok_or(SlideError::MissingNode("a:p"))?;

        // The prototype paragraph keeps only its first run.
        for &run in self.doc().find_descendants(first, "a:r").iter().skip(1) {
            self.doc_mut().detach(run);
        }
        for &p in &paragraphs {
            self.doc_mut().detach(p);
        }

        let fill_empty = self.fill_empty();
        for line in lines {
            let p = self.doc_mut().deep_clone(first);
            let t = self
                .doc()
                .find_descendant(p, "a:t")
                .ok_or(SlideError::NoTextRun)?;
            let content = if fill_empty { "" } else { line.as_ref() };
            self.doc_mut().set_text(t, content);
            self.doc_mut().append_child(tx_body, p);
        }
        Ok(())
    }

    /// Rewrite a shape's first solid fill with the given hex color.
    pub fn set_element_text_color(&mut self, node: NodeId, color: &str) -> Result<()> {
        let fill = self
            .doc()
            .find_descendant(node, "a:solidFill")
            .ok_or(SlideError::MissingNode("a:solidFill"))?;
        self.doc_mut().clear_children(fill);
        let srgb = self.doc_mut().create_element("a:srgbClr");
        self.doc_mut().set_attr(srgb, "val", color);
        self.doc_mut().append_child(fill, srgb);
        Ok(())
    }

    /// A shape's solid fill color as hex.
    pub fn element_fill_color(&self, node: NodeId) -> Result<String> {
        for fill in self.doc().find_descendants(node, "a:solidFill") {
            if let Some(srgb) = self.doc().find_child(fill, "a:srgbClr")
                && let Some(val) = self.doc().attr(srgb, "val")
            {
                return Ok(val.to_string());
            }
        }
        Err(SlideError::MissingNode("a:srgbClr"))
    }

    /// Set or clear the text direction (`vert` on `a:bodyPr`, e.g.
    /// "vert270"; `None` restores horizontal text).
    pub fn set_element_text_direction(&mut self, node: NodeId, direction: Option<&str>) -> Result<()> {
        let body_pr = self
            .doc()
            .find_descendant(node, "a:bodyPr")
            .ok_or(SlideError::MissingNode("a:bodyPr"))?;
        match direction {
            Some(dir) => self.doc_mut().set_attr(body_pr, "vert", dir),
            None => self.doc_mut().remove_attr(body_pr, "vert"),
        }
        Ok(())
    }

    /// Set or clear the paragraph alignment (`algn` on `a:pPr`).
    pub fn set_element_text_alignment(&mut self, node: NodeId, alignment: Option<&str>) -> Result<()> {
        let p_pr = self
            .doc()
            .find_descendant(node, "a:pPr")
            .ok_or(SlideError::MissingNode("a:pPr"))?;
        match alignment {
            Some(algn) => self.doc_mut().set_attr(p_pr, "algn", algn),
            None => self.doc_mut().remove_attr(p_pr, "algn"),
        }
        Ok(())
    }

    /// Set the left/right body insets in EMUs.
    pub fn set_element_text_insets(
        &mut self,
        node: NodeId,
        left: Option<i64>,
        right: Option<i64>,
    ) -> Result<()> {
        let body_pr = self
            .doc()
            .find_descendant(node, "a:bodyPr")
            .ok_or(SlideError::MissingNode("a:bodyPr"))?;
        if let Some(l) = left {
            self.doc_mut().set_attr(body_pr, "lIns", l.to_string());
        }
        if let Some(r) = right {
            self.doc_mut().set_attr(body_pr, "rIns", r.to_string());
        }
        Ok(())
    }

    /// Font size of the first run in hundredths of a point.
    pub fn element_font_size(&self, node: NodeId) -> Result<i64> {
        let r_pr = self
            .doc()
            .find_descendant(node, "a:rPr")
            .ok_or(SlideError::MissingNode("a:rPr"))?;
        self.doc()
            .attr(r_pr, "sz")
            .and_then(|v| v.parse().ok())
            .ok_or(SlideError::BadAttr("sz"))
    }

    /// Set the first run's font size in hundredths of a point.
    pub fn set_element_font_size(&mut self, node: NodeId, size: f64) -> Result<()> {
        let r_pr = self
            .doc()
            .find_descendant(node, "a:rPr")
            .ok_or(SlideError::MissingNode("a:rPr"))?;
        self.doc_mut()
            .set_attr(r_pr, "sz", (size.round() as i64).to_string());
        Ok(())
    }

    /// Set the first run's font size in points.
    pub fn set_element_text_size_pt(&mut self, node: NodeId, points: f64) -> Result<()> {
        self.set_element_font_size(node, points.round() * 100.0)
    }

    /// Insert a color-replacement on a picture's image reference.
    pub fn replace_pic_color(&mut self, node: NodeId, color: &str) -> Result<()> {
        let blip = self
            .doc()
            .find_descendant(node, "a:blip")
            .ok_or(SlideError::MissingNode("a:blip"))?;
        let clr_repl = self.doc_mut().create_element("a:clrRepl");
        self.doc_mut().insert_child(blip, 0, clr_repl);
        let srgb = self.doc_mut().create_element("a:srgbClr");
        self.doc_mut().set_attr(srgb, "val", color);
        self.doc_mut().append_child(clr_repl, srgb);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::testutil::slide_doc;
    use super::*;

    #[test]
    fn test_set_element_text_removes_stale_runs() {
        let mut slide = slide_doc();
        slide.index_shapes();
        let shape = slide.shape("B2").unwrap();

        slide.set_element_text(shape, "42%").unwrap();
        let runs = slide.doc().find_descendants(shape, "a:t");
        assert_eq!(runs.len(), 1);
        assert_eq!(slide.doc().text(runs[0]), Some("42%"));
    }

    #[test]
    fn test_set_text_missing_shape_is_a_warning() {
        let mut slide = slide_doc();
        slide.index_shapes();
        // No such title: degrades to a logged warning, not an error.
        slide.set_text("Z99", "x").unwrap();
    }

    #[test]
    fn test_set_element_text_lines_clones_formatting() {
        let mut slide = slide_doc();
        slide.index_shapes();
        let shape = slide.shape("B2").unwrap();

        slide
            .set_element_text_lines(shape, &["Global", "Advisory"])
            .unwrap();
        let paragraphs = slide.doc().find_descendants(shape, "a:p");
        assert_eq!(paragraphs.len(), 2);
        for &p in &paragraphs {
            // Each paragraph kept the prototype's run properties...
            assert!(slide.doc().find_descendant(p, "a:rPr").is_some());
            // ...and carries exactly one run.
            assert_eq!(slide.doc().find_descendants(p, "a:r").len(), 1);
        }
        let texts: Vec<_> = paragraphs
            .iter()
            .map(|&p| {
                let t = slide.doc().find_descendant(p, "a:t").unwrap();
                slide.doc().text(t).unwrap().to_string()
            })
            .collect();
        assert_eq!(texts, vec!["Global", "Advisory"]);
    }

    #[test]
    fn test_fill_color_round_trip() {
        let mut slide = slide_doc();
        let shape = slide.find_by_title("B2").unwrap();
        assert_eq!(slide.element_fill_color(shape).unwrap(), "112233");

        slide.set_element_text_color(shape, "FF0000").unwrap();
        assert_eq!(slide.element_fill_color(shape).unwrap(), "FF0000");
    }

    #[test]
    fn test_text_direction_and_alignment() {
        let mut slide = slide_doc();
        let shape = slide.find_by_title("B2").unwrap();

        slide.set_element_text_direction(shape, Some("vert270")).unwrap();
        let body_pr = slide.doc().find_descendant(shape, "a:bodyPr").unwrap();
        assert_eq!(slide.doc().attr(body_pr, "vert"), Some("vert270"));
        slide.set_element_text_direction(shape, None).unwrap();
        assert_eq!(slide.doc().attr(body_pr, "vert"), None);

        slide.set_element_text_alignment(shape, Some("r")).unwrap();
        let p_pr = slide.doc().find_descendant(shape, "a:pPr").unwrap();
        assert_eq!(slide.doc().attr(p_pr, "algn"), Some("r"));
    }

    #[test]
    fn test_font_size() {
        let mut slide = slide_doc();
        let shape = slide.find_by_title("B2").unwrap();
        assert_eq!(slide.element_font_size(shape).unwrap(), 1400);

        slide.set_element_text_size_pt(shape, 13.6).unwrap();
        assert_eq!(slide.element_font_size(shape).unwrap(), 1400);

        slide.set_element_text_size_pt(shape, 12.0).unwrap();
        assert_eq!(slide.element_font_size(shape).unwrap(), 1200);
    }

    #[test]
    fn test_fill_empty_blanks_text() {
        let mut slide = slide_doc();
        slide.fill_empty = true;
        slide.index_shapes();
        slide.set_text("B2", "should not appear").unwrap();
        let shape = slide.shape("B2").unwrap();
        let t = slide.doc().find_descendant(shape, "a:t").unwrap();
        assert_eq!(slide.doc().text(t), Some(""));
    }
}
