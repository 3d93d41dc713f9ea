//! Composite shape insertion built on template cloning: connector lines
//! between two points and circles centered on a point.

use super::{Result, SlideDoc, SlideError};
use crate::xml::NodeId;

impl SlideDoc {
    /// Clone a line template and stretch it between two points.
    ///
    /// The connector extent is always positive: ends given in descending
    /// order are swapped and the matching flip flag set, so the line
    /// still runs visually from `(x0, y0)` to `(x1, y1)`.
    pub fn add_line(
        &mut self,
        x0: f64,
        y0: f64,
        x1: f64,
        y1: f64,
        template: &str,
        target: Option<NodeId>,
    ) -> Result<NodeId> {
        let (mut x0, mut y0, mut x1, mut y1) = (x0, y0, x1, y1);
        let mut flip_h = false;
        let mut flip_v = false;
        if x0 > x1 {
            std::mem::swap(&mut x0, &mut x1);
            flip_h = true;
        }
        if y0 > y1 {
            std::mem::swap(&mut y0, &mut y1);
            flip_v = true;
        }
        let (x0, y0, x1, y1) = (x0.round(), y0.round(), x1.round(), y1.round());

        let node = self.clone_template(template)?;

        // Stale connection references on the clone would point at shapes
        // of the removed prototype context.
        if let Some(cnv_cxn) = self.doc().find_descendant(node, "p:cNvCxnSpPr") {
            self.doc_mut().clear(cnv_cxn);
        }

        self.set_element_flip_h(node, flip_h)?;
        self.set_element_flip_v(node, flip_v)?;

        let xfrm = self.xfrm_of(node)?;
        let ext = self
            .doc()
            .find_child(xfrm, "a:ext")
            .ok_or_else(|| SlideError::NoTransform(template.to_string()))?;
        self.doc_mut().set_attr(ext, "cx", ((x1 - x0) as i64).to_string());
        self.doc_mut().set_attr(ext, "cy", ((y1 - y0) as i64).to_string());

        self.set_element_pos(node, Some(x0), Some(y0))?;
        self.add_shape(node, target)?;
        Ok(node)
    }

    /// Clone a circle template centered on the given point.
    pub fn add_circle(
        &mut self,
        x: f64,
        y: f64,
        template: &str,
        target: Option<NodeId>,
    ) -> Result<NodeId> {
        let node = self.clone_template(template)?;
        let (w, h) = self.element_sizes(node)?;

        self.set_element_pos(node, Some(x - w as f64 / 2.0), Some(y - h as f64 / 2.0))?;
        self.add_shape(node, target)?;
        Ok(node)
    }
}
