//! The tube: ordered cross-sections joined by lateral segments.

use tracing::{debug, info, warn};

use tube_kernel_math::{BoundingBox, Transform, Vec3};
use tube_kernel_section::Section;
use tube_kernel_segment::{ConnectSettings, GeometryRefresh, Segment, SegmentError};

use crate::error::{Result, TubeError};
use crate::mesh::{self, MeshOptions, TubeConstructionResult};

/// Outcome of building segments for every consecutive section pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildReport {
    /// Pairs that were joined.
    pub built: Vec<(usize, usize)>,
    /// Pairs that could not be joined, with the reason.
    pub failed: Vec<(usize, usize, SegmentError)>,
}

impl BuildReport {
    /// `true` if every pair was joined.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Sort key: height of the first point. Empty sections sort last.
fn section_key(section: &Section) -> f32 {
    section.z().unwrap_or(f32::INFINITY)
}

/// An extruded shape defined by cross-sections ordered by height.
///
/// Sections are identified by their position; segments refer to sections by
/// position and are renumbered whenever sections move.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tube {
    sections: Vec<Section>,
    segments: Vec<Segment>,
}

impl Tube {
    /// Empty tube.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tube from sections and segments as stored, without validation.
    pub fn from_parts(sections: Vec<Section>, segments: Vec<Segment>) -> Self {
        Self { sections, segments }
    }

    // ---- sections --------------------------------------------------------

    /// Validate `section` and insert it at its height-sorted position.
    ///
    /// Returns the position. Segments pointing at or past that position are
    /// shifted up by one.
    pub fn add_section(&mut self, section: Section) -> Result<usize> {
        section.validate()?;
        let key = section_key(&section);
        let pos = self.sections.partition_point(|s| section_key(s) <= key);
        for seg in &mut self.segments {
            seg.remap_sections(|i| if i >= pos { i + 1 } else { i });
        }
        self.sections.insert(pos, section);
        debug!(position = pos, z = key, "section added");
        Ok(pos)
    }

    /// Remove the section at `index` together with every segment touching it.
    pub fn remove_section(&mut self, index: usize) -> Result<Section> {
        self.check_section(index)?;
        self.segments.retain(|s| !s.touches(index));
        for seg in &mut self.segments {
            seg.remap_sections(|i| if i > index { i - 1 } else { i });
        }
        Ok(self.sections.remove(index))
    }

    /// Section at `index`.
    pub fn section(&self, index: usize) -> Option<&Section> {
        self.sections.get(index)
    }

    /// Mutable section at `index`.
    ///
    /// Segments are not refreshed; call [`Tube::update_segment_geometry`]
    /// or rebuild after editing points.
    pub fn section_mut(&mut self, index: usize) -> Option<&mut Section> {
        self.sections.get_mut(index)
    }

    /// All sections in order.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Number of sections.
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Remove every section and segment.
    pub fn clear_sections(&mut self) {
        self.sections.clear();
        self.segments.clear();
    }

    /// `true` if there are no sections.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    fn check_section(&self, index: usize) -> Result<()> {
        if index >= self.sections.len() {
            return Err(TubeError::SectionOutOfRange {
                index,
                len: self.sections.len(),
            });
        }
        Ok(())
    }

    fn check_connection(&self, start: usize, end: usize) -> Result<()> {
        if start == end || start >= self.sections.len() || end >= self.sections.len() {
            return Err(TubeError::InvalidConnection { start, end });
        }
        Ok(())
    }

    // ---- segments --------------------------------------------------------

    /// Append a segment after checking that it joins two existing sections.
    pub fn add_segment(&mut self, segment: Segment) -> Result<usize> {
        self.check_connection(segment.start_section(), segment.end_section())?;
        self.segments.push(segment);
        Ok(self.segments.len() - 1)
    }

    /// Remove the segment at `index`.
    pub fn remove_segment(&mut self, index: usize) -> Result<Segment> {
        if index >= self.segments.len() {
            return Err(TubeError::SegmentOutOfRange {
                index,
                len: self.segments.len(),
            });
        }
        Ok(self.segments.remove(index))
    }

    /// Segment at `index`.
    pub fn segment(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    /// All segments.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of segments.
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Remove every segment.
    pub fn clear_segments(&mut self) {
        self.segments.clear();
    }

    /// Build (or replace) the segment joining sections `start` and `end`.
    pub fn build_segment(&mut self, start: usize, end: usize, settings: &ConnectSettings) -> Result<usize> {
        self.check_connection(start, end)?;
        let segment = Segment::connect(
            start,
            &self.sections[start],
            end,
            &self.sections[end],
            settings,
        )?;
        Ok(self.store_segment(segment))
    }

    fn store_segment(&mut self, segment: Segment) -> usize {
        let (a, b) = (segment.start_section(), segment.end_section());
        match self.find_segment_between(a, b) {
            Some(i) => {
                self.segments[i] = segment;
                i
            }
            None => {
                self.segments.push(segment);
                self.segments.len() - 1
            }
        }
    }

    /// Sort sections by height, drop every existing segment and join each
    /// consecutive pair.
    ///
    /// Pairs that fail are listed in the report and left without a segment;
    /// the successful ones are kept either way.
    pub fn build_all_segments(&mut self, settings: &ConnectSettings) -> Result<BuildReport> {
        if self.sections.len() < 2 {
            return Err(TubeError::TooFewSections(self.sections.len()));
        }
        self.sort_sections_by_z();
        self.segments.clear();

        let mut report = BuildReport::default();
        for i in 0..self.sections.len() - 1 {
            match Segment::connect(i, &self.sections[i], i + 1, &self.sections[i + 1], settings) {
                Ok(segment) => {
                    debug!(start = i, end = i + 1, edges = segment.edge_count(), "segment built");
                    self.segments.push(segment);
                    report.built.push((i, i + 1));
                }
                Err(err) => {
                    warn!(start = i, end = i + 1, error = %err, "sections cannot be connected");
                    report.failed.push((i, i + 1, err));
                }
            }
        }

        info!(
            built = report.built.len(),
            failed = report.failed.len(),
            "segment build finished"
        );
        Ok(report)
    }

    /// Same as [`Tube::build_all_segments`], which always starts from an
    /// empty segment list.
    pub fn rebuild_all_segments(&mut self, settings: &ConnectSettings) -> Result<BuildReport> {
        self.build_all_segments(settings)
    }

    // ---- measurements ----------------------------------------------------

    /// Summed length of all vertex-to-vertex lateral edges.
    pub fn total_length(&self) -> f32 {
        self.segments
            .iter()
            .filter_map(|seg| {
                let start = self.sections.get(seg.start_section())?;
                let end = self.sections.get(seg.end_section())?;
                Some(seg.total_length(start, end))
            })
            .sum()
    }

    /// Bounds of every section point.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.sections.iter().flat_map(|s| s.points()))
    }

    /// Section centroids averaged with point-count weights.
    pub fn center_of_mass(&self) -> Vec3 {
        let mut sum = Vec3::zeros();
        let mut weight = 0usize;
        for s in &self.sections {
            sum += s.centroid() * s.len() as f32;
            weight += s.len();
        }
        if weight == 0 {
            return Vec3::zeros();
        }
        sum / weight as f32
    }

    // ---- transforms ------------------------------------------------------

    /// Move every section. Lateral edges follow.
    pub fn translate(&mut self, offset: &Vec3) {
        for s in &mut self.sections {
            s.translate(offset);
        }
        self.update_segment_geometry();
    }

    /// Scale every section about its own centroid. Lateral edges follow.
    pub fn scale(&mut self, factor: f32) {
        for s in &mut self.sections {
            s.scale(factor);
        }
        self.update_segment_geometry();
    }

    /// Rotate the whole tube about the Z axis through its center of mass.
    pub fn rotate_about_z(&mut self, degrees: f32) {
        let t = Transform::rotation_z_about(&self.center_of_mass(), degrees.to_radians());
        for s in &mut self.sections {
            s.transform(&t);
        }
        self.update_segment_geometry();
    }

    // ---- validity --------------------------------------------------------

    /// At least two valid sections, valid segments and enough of them.
    pub fn is_valid(&self) -> bool {
        self.sections.len() >= 2
            && self.sections.iter().all(Section::is_valid)
            && self.segments.iter().all(Segment::is_valid)
            && self.has_valid_topology()
    }

    /// Enough segments to chain every section.
    pub fn has_valid_topology(&self) -> bool {
        self.segments.len() >= self.sections.len().saturating_sub(1)
    }

    /// Section pairs whose vertex-anchored lateral edges cross.
    pub fn problematic_segments(&self) -> Vec<(usize, usize)> {
        self.segments
            .iter()
            .filter(|s| s.has_intersecting_edges())
            .map(|s| (s.start_section(), s.end_section()))
            .collect()
    }

    /// Every segment references existing sections and in-range points.
    pub fn validate_indices(&self) -> bool {
        self.segments.iter().all(|seg| {
            let (a, b) = (seg.start_section(), seg.end_section());
            match (self.sections.get(a), self.sections.get(b)) {
                (Some(sa), Some(sb)) => a != b && seg.validate_indices(sa.len(), sb.len()),
                _ => false,
            }
        })
    }

    // ---- ordering and lookup ---------------------------------------------

    /// Positions sorted by first-point height (stable).
    pub fn section_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.sections.len()).collect();
        order.sort_by(|&a, &b| section_key(&self.sections[a]).total_cmp(&section_key(&self.sections[b])));
        order
    }

    /// Reorder sections by height and renumber segments to match.
    pub fn sort_sections_by_z(&mut self) {
        let order = self.section_order();
        if order.iter().enumerate().all(|(i, &o)| i == o) {
            return;
        }
        let mut new_position = vec![0; order.len()];
        for (new, &old) in order.iter().enumerate() {
            new_position[old] = new;
        }

        let mut slots: Vec<Option<Section>> = std::mem::take(&mut self.sections).into_iter().map(Some).collect();
        self.sections = order.iter().filter_map(|&old| slots[old].take()).collect();
        for seg in &mut self.segments {
            seg.remap_sections(|i| new_position.get(i).copied().unwrap_or(i));
        }
    }

    /// Position of the segment joining `a` and `b`, in either direction.
    pub fn find_segment_between(&self, a: usize, b: usize) -> Option<usize> {
        self.segments.iter().position(|s| s.joins(a, b))
    }

    /// Sections joined to `index` by a segment.
    pub fn adjacent_sections(&self, index: usize) -> Vec<usize> {
        self.segments
            .iter()
            .filter_map(|s| {
                if s.start_section() == index {
                    Some(s.end_section())
                } else if s.end_section() == index {
                    Some(s.start_section())
                } else {
                    None
                }
            })
            .collect()
    }

    // ---- derived geometry ------------------------------------------------

    /// Section centroids in section order.
    pub fn centers_curve(&self) -> Vec<Vec3> {
        self.sections.iter().map(Section::centroid).collect()
    }

    /// Move lateral edge endpoints onto the current section geometry.
    pub fn update_segment_geometry(&mut self) -> GeometryRefresh {
        let mut total = GeometryRefresh::default();
        for seg in &mut self.segments {
            let (Some(start), Some(end)) = (
                self.sections.get(seg.start_section()),
                self.sections.get(seg.end_section()),
            ) else {
                continue;
            };
            total += seg.refresh_geometry(start, end);
        }
        if total.stale > 0 {
            debug!(stale = total.stale, "lateral endpoints need a rebuild");
        }
        total
    }

    /// Assemble the triangle mesh.
    pub fn build_mesh(&self, options: &MeshOptions) -> TubeConstructionResult {
        mesh::build(self, options)
    }
}
