//! Shape geometry: offsets, extents, rotation and flips.
//!
//! All coordinates are EMUs. Rectangle math everywhere works on
//! `(x0, y0, x1, y1)` corner tuples derived from offset + extent.

use super::{Result, SlideDoc, SlideError};
use crate::xml::NodeId;

impl SlideDoc {
    /// The first transform node under a shape (`a:xfrm`, or `p:xfrm` on
    /// graphic frames). Group-only containers without their own offset
    /// fall through to their child transform.
    pub(crate) fn xfrm_of(&self, node: NodeId) -> Result<NodeId> {
        self.doc()
            .find_descendant_local(node, "xfrm")
            .ok_or_else(|| SlideError::NoTransform(self.describe(node)))
    }

    fn describe(&self, node: NodeId) -> String {
        match self.title_of(node) {
            Some(title) => title.to_string(),
            None => self.doc().name(node).to_string(),
        }
    }

    fn off_of(&self, node: NodeId) -> Result<NodeId> {
        let xfrm = self.xfrm_of(node)?;
        self.doc()
            .find_child(xfrm, "a:off")
            .ok_or_else(|| SlideError::NoTransform(self.describe(node)))
    }

    fn ext_of(&self, node: NodeId) -> Result<NodeId> {
        let xfrm = self.xfrm_of(node)?;
        self.doc()
            .find_child(xfrm, "a:ext")
            .ok_or_else(|| SlideError::NoTransform(self.describe(node)))
    }

    fn int_attr(&self, node: NodeId, name: &'static str) -> Result<i64> {
        self.doc()
            .attr(node, name)
            .and_then(|v| v.parse().ok())
            .ok_or(SlideError::BadAttr(name))
    }

    /// A shape's corner rectangle `(x0, y0, x1, y1)`.
    pub fn element_coords(&self, node: NodeId) -> Result<(i64, i64, i64, i64)> {
        let off = self.off_of(node)?;
        let ext = self.ext_of(node)?;
        let x0 = self.int_attr(off, "x")?;
        let y0 = self.int_attr(off, "y")?;
        let x1 = x0 + self.int_attr(ext, "cx")?;
        let y1 = y0 + self.int_attr(ext, "cy")?;
        Ok((x0, y0, x1, y1))
    }

    /// A shape's `(width, height)`.
    pub fn element_sizes(&self, node: NodeId) -> Result<(i64, i64)> {
        let (x0, y0, x1, y1) = self.element_coords(node)?;
        Ok((x1 - x0, y1 - y0))
    }

    /// Corner rectangle of an indexed shape, by title.
    pub fn shape_coords(&self, title: &str) -> Result<(i64, i64, i64, i64)> {
        let node = self
            .shape(title)
            .ok_or_else(|| SlideError::ShapeNotFound(title.to_string()))?;
        self.element_coords(node)
    }

    /// Set a shape's position. An omitted axis stays untouched; values
    /// round to the nearest EMU.
    pub fn set_element_pos(&mut self, node: NodeId, x: Option<f64>, y: Option<f64>) -> Result<()> {
        let off = self.off_of(node)?;
        if let Some(x) = x {
            self.doc_mut().set_attr(off, "x", (x.round() as i64).to_string());
        }
        if let Some(y) = y {
            self.doc_mut().set_attr(off, "y", (y.round() as i64).to_string());
        }
        Ok(())
    }

    /// Shift a shape's existing position by the given deltas.
    pub fn mod_element_pos(&mut self, node: NodeId, dx: Option<f64>, dy: Option<f64>) -> Result<()> {
        let off = self.off_of(node)?;
        let x = self.int_attr(off, "x")?;
        let y = self.int_attr(off, "y")?;
        self.set_element_pos(node, dx.map(|d| x as f64 + d), dy.map(|d| y as f64 + d))
    }

    /// Set a shape's extent. An omitted axis stays untouched; values
    /// round to the nearest EMU.
    pub fn set_element_size(&mut self, node: NodeId, w: Option<f64>, h: Option<f64>) -> Result<()> {
        let ext = self.ext_of(node)?;
        if let Some(w) = w {
            self.doc_mut().set_attr(ext, "cx", (w.round() as i64).to_string());
        }
        if let Some(h) = h {
            self.doc_mut().set_attr(ext, "cy", (h.round() as i64).to_string());
        }
        Ok(())
    }

    /// A shape's rotation in 60000ths of a degree (0 when unset).
    pub fn element_rotation(&self, node: NodeId) -> Result<f64> {
        let xfrm = self.xfrm_of(node)?;
        Ok(self
            .doc()
            .attr(xfrm, "rot")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0.0))
    }

    /// Set a shape's rotation in 60000ths of a degree, rounded.
    pub fn set_element_rotation(&mut self, node: NodeId, angle: f64) -> Result<()> {
        let xfrm = self.xfrm_of(node)?;
        self.doc_mut()
            .set_attr(xfrm, "rot", (angle.round() as i64).to_string());
        Ok(())
    }

    /// Set or clear the horizontal flip flag.
    pub fn set_element_flip_h(&mut self, node: NodeId, flag: bool) -> Result<()> {
        self.set_flip(node, "flipH", flag)
    }

    /// Set or clear the vertical flip flag.
    pub fn set_element_flip_v(&mut self, node: NodeId, flag: bool) -> Result<()> {
        self.set_flip(node, "flipV", flag)
    }

    fn set_flip(&mut self, node: NodeId, attr: &'static str, flag: bool) -> Result<()> {
        let xfrm = self.xfrm_of(node)?;
        if flag {
            self.doc_mut().set_attr(xfrm, attr, "1");
        } else {
            self.doc_mut().remove_attr(xfrm, attr);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::testutil::slide_doc;
    use super::*;

    #[test]
    fn test_element_coords() {
        let slide = slide_doc();
        let shape = slide.find_by_title("B2").unwrap();
        assert_eq!(slide.element_coords(shape).unwrap(), (100, 200, 400, 600));
        assert_eq!(slide.element_sizes(shape).unwrap(), (300, 400));
    }

    #[test]
    fn test_group_falls_back_to_child_transform() {
        let slide = slide_doc();
        let group = slide.find_by_title("chart-group").unwrap();
        assert_eq!(slide.element_coords(group).unwrap(), (1000, 1000, 3000, 2000));
    }

    #[test]
    fn test_missing_transform_is_an_error() {
        let slide = slide_doc();
        let shape = slide.find_by_title("dup").unwrap();
        assert!(matches!(
            slide.element_coords(shape),
            Err(SlideError::NoTransform(_))
        ));
    }

    #[test]
    fn test_set_pos_partial_axes() {
        let mut slide = slide_doc();
        let shape = slide.find_by_title("B2").unwrap();
        slide.set_element_pos(shape, Some(150.4), None).unwrap();
        assert_eq!(slide.element_coords(shape).unwrap(), (150, 200, 450, 600));

        slide.set_element_size(shape, None, Some(99.6)).unwrap();
        assert_eq!(slide.element_coords(shape).unwrap(), (150, 200, 450, 300));
    }

    #[test]
    fn test_mod_element_pos() {
        let mut slide = slide_doc();
        let shape = slide.find_by_title("B2").unwrap();
        slide.mod_element_pos(shape, Some(-50.0), Some(25.0)).unwrap();
        let (x0, y0, _, _) = slide.element_coords(shape).unwrap();
        assert_eq!((x0, y0), (50, 225));
    }

    #[test]
    fn test_rotation_and_flips() {
        let mut slide = slide_doc();
        let shape = slide.find_by_title("B2").unwrap();
        assert_eq!(slide.element_rotation(shape).unwrap(), 0.0);

        slide.set_element_rotation(shape, 5_400_000.4).unwrap();
        assert_eq!(slide.element_rotation(shape).unwrap(), 5_400_000.0);

        slide.set_element_flip_v(shape, true).unwrap();
        let xfrm = slide.xfrm_of(shape).unwrap();
        assert_eq!(slide.doc().attr(xfrm, "flipV"), Some("1"));
        slide.set_element_flip_v(shape, false).unwrap();
        assert_eq!(slide.doc().attr(xfrm, "flipV"), None);
    }
}
