use crate::{BBox, Cubic, Curve, EllipArc, Line, Point, Quad, Scalar, Segment, Transform};
use std::{
    fmt,
    io::{Read, Write},
    str::FromStr,
};

/// Flatness of 0.05px gives good accuracy tradeoff
pub const DEFAULT_FLATNESS: Scalar = 0.05;

/// The winding rule used to determine which parts of a self-overlapping
/// path are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FillRule {
    NonZero,
    EvenOdd,
}

impl FillRule {
    /// Whether a region with the provided winding number is filled
    pub fn is_filled(self, winding: i32) -> bool {
        match self {
            FillRule::NonZero => winding != 0,
            FillRule::EvenOdd => winding % 2 != 0,
        }
    }
}

impl Default for FillRule {
    fn default() -> Self {
        Self::NonZero
    }
}

/// Non-empty collections of segments where end of each segments coincides with the start of the next one.
#[derive(Clone, PartialEq)]
pub struct SubPath {
    /// List of segments representing SubPath
    segments: Vec<Segment>,
    /// Whether SubPath contains an implicit line segment connecting start and the end of it.
    closed: bool,
}

impl fmt::Debug for SubPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in self.segments.iter() {
            writeln!(f, "{:?}", segment)?;
        }
        if self.closed {
            writeln!(f, "Close")?;
        } else {
            writeln!(f, "End")?
        }
        Ok(())
    }
}

impl SubPath {
    pub fn new(segments: Vec<Segment>, closed: bool) -> Option<Self> {
        if segments.is_empty() {
            None
        } else {
            Some(Self { segments, closed })
        }
    }

    pub fn closed(&self) -> bool {
        self.closed
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn first(&self) -> Segment {
        *self.segments.first().expect("SubPath is never empty")
    }

    pub fn last(&self) -> Segment {
        *self.segments.last().expect("SubPath is never empty")
    }

    /// Apply transformation to the sub-path in place
    pub fn transform(&mut self, tr: Transform) {
        for segment in self.segments.iter_mut() {
            *segment = segment.transform(tr);
        }
    }

    pub fn flatten(
        &self,
        tr: Transform,
        flatness: Scalar,
        close: bool,
    ) -> impl Iterator<Item = Line> + '_ {
        let last = if self.closed || close {
            Some(Line::new(self.end(), self.start()).transform(tr))
        } else {
            None
        };
        self.segments
            .iter()
            .flat_map(move |segment| segment.flatten(tr, flatness))
            .chain(last)
    }

    pub fn start(&self) -> Point {
        self.first().start()
    }

    pub fn end(&self) -> Point {
        self.last().end()
    }

    pub fn bbox(&self, init: Option<BBox>, tr: Transform) -> BBox {
        self.segments
            .iter()
            .fold(init, |bbox, seg| Some(seg.transform(tr).bbox(bbox)))
            .expect("SubPath is never empty")
    }

    /// Reverse order and direction of all segments
    pub fn reverse(&self) -> Self {
        Self {
            segments: self.segments.iter().rev().map(|s| s.reverse()).collect(),
            closed: self.closed,
        }
    }
}

/// Collection of the SubPath treated as a single unit
#[derive(Clone, PartialEq, Default)]
pub struct Path {
    subpaths: Vec<SubPath>,
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.subpaths.is_empty() {
            write!(f, "Empty")?;
        } else {
            for subpath in self.subpaths.iter() {
                subpath.fmt(f)?
            }
        }
        Ok(())
    }
}

impl Path {
    /// Create path from the list of subpaths
    pub fn new(subpaths: Vec<SubPath>) -> Self {
        Self { subpaths }
    }

    pub fn empty() -> Self {
        Self {
            subpaths: Default::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.subpaths.is_empty()
    }

    pub fn subpaths(&self) -> &[SubPath] {
        &self.subpaths
    }

    /// Convenience method to create `PathBuilder`
    pub fn builder() -> PathBuilder {
        PathBuilder::new()
    }

    pub fn into_builder(self) -> PathBuilder {
        PathBuilder::from_path(self)
    }

    /// Apply transformation to the path in place
    pub fn transform(&mut self, tr: Transform) {
        for subpath in self.subpaths.iter_mut() {
            subpath.transform(tr);
        }
    }

    pub fn segments_count(&self) -> usize {
        self.subpaths
            .iter()
            .fold(0usize, |acc, subpath| acc + subpath.segments().len())
    }

    /// Convert path to an iterator over line segments
    pub fn flatten(
        &self,
        tr: Transform,
        flatness: Scalar,
        close: bool,
    ) -> impl Iterator<Item = Line> + '_ {
        PathFlattenIter::new(self, tr, flatness, close)
    }

    /// Bounding box of the path after provided transformation is applied.
    pub fn bbox(&self, tr: Transform) -> Option<BBox> {
        self.subpaths
            .iter()
            .fold(None, |bbox, subpath| Some(subpath.bbox(bbox, tr)))
    }

    /// Reverse order and direction of all segments
    pub fn reverse(&self) -> Self {
        Self {
            subpaths: self.subpaths.iter().map(|s| s.reverse()).collect(),
        }
    }

    /// Winding number of the path around the provided point
    ///
    /// Calculated by counting signed crossings of a horizontal ray cast towards
    /// positive x. Edges are treated as half-open intervals in y so that a ray
    /// passing through a shared vertex is counted consistently.
    pub fn winding_at(&self, point: impl Into<Point>) -> i32 {
        self.winding_with_flatness(point.into(), DEFAULT_FLATNESS)
    }

    pub(crate) fn winding_with_flatness(&self, point: Point, flatness: Scalar) -> i32 {
        let Point([px, py]) = point;
        let mut winding = 0;
        for line in self.flatten(Transform::identity(), flatness, true) {
            let Line([Point([x0, y0]), Point([x1, y1])]) = line;
            let up = y0 <= py && py < y1;
            let down = y1 <= py && py < y0;
            if !up && !down {
                continue;
            }
            let t = (py - y0) / (y1 - y0);
            let x = x0 + t * (x1 - x0);
            if x > px {
                winding += if up { 1 } else { -1 };
            }
        }
        winding
    }

    /// Determine if the point is inside the path filled with the given rule
    pub fn contains(&self, point: impl Into<Point>, fill_rule: FillRule) -> bool {
        fill_rule.is_filled(self.winding_at(point))
    }

    /// Net enclosed area of the path.
    ///
    /// Computed exactly per segment with Green's theorem, beziers included,
    /// no flattening involved. Counter-clockwise contours contribute
    /// positive area, clockwise contours (holes) negative. Open subpaths
    /// are implicitly closed first.
    pub fn area(&self) -> Scalar {
        let mut area = 0.0;
        for subpath in self.subpaths.iter() {
            for segment in subpath.segments() {
                // twice the signed area swept by the segment
                area += match segment {
                    Segment::Line(Line([p0, p1])) => p0.cross(*p1),
                    Segment::Quad(Quad([p0, p1, p2])) => {
                        (2.0 * p0.cross(*p1) + 2.0 * p1.cross(*p2) + p0.cross(*p2)) / 3.0
                    }
                    Segment::Cubic(Cubic([p0, p1, p2, p3])) => {
                        (6.0 * p0.cross(*p1)
                            + 3.0 * p1.cross(*p2)
                            + 6.0 * p2.cross(*p3)
                            + 3.0 * p0.cross(*p2)
                            + 3.0 * p1.cross(*p3)
                            + p0.cross(*p3))
                            / 10.0
                    }
                };
            }
            // implicit closing segment
            area += subpath.end().cross(subpath.start());
        }
        area / 2.0
    }

    /// Distance from the point to the closest position on the path outline
    pub fn dist_to_point(&self, point: impl Into<Point>) -> Option<Scalar> {
        self.dist_with_flatness(point.into(), DEFAULT_FLATNESS)
    }

    pub(crate) fn dist_with_flatness(&self, point: Point, flatness: Scalar) -> Option<Scalar> {
        self.flatten(Transform::identity(), flatness, false)
            .map(|line| line.dist_to_point(point))
            .min_by(Scalar::total_cmp)
    }

    /// Save path in SVG path format.
    pub fn save(&self, mut out: impl Write) -> std::io::Result<()> {
        for subpath in self.subpaths.iter() {
            write!(&mut out, "M{:?} ", subpath.start())?;
            let mut segment_type: Option<u8> = None;
            for segment in subpath.segments().iter() {
                match segment {
                    Segment::Line(line) => {
                        if segment_type.replace(b'L') != Some(b'L') {
                            out.write_all(b"L")?;
                        }
                        write!(&mut out, "{:?} ", line.end())?;
                    }
                    Segment::Quad(quad) => {
                        let [_, p1, p2] = quad.points();
                        if segment_type.replace(b'Q') != Some(b'Q') {
                            out.write_all(b"Q")?;
                        }
                        write!(&mut out, "{:?} {:?} ", p1, p2)?;
                    }
                    Segment::Cubic(cubic) => {
                        let [_, p1, p2, p3] = cubic.points();
                        if segment_type.replace(b'C') != Some(b'C') {
                            out.write_all(b"C")?;
                        }
                        write!(&mut out, "{:?} {:?} {:?} ", p1, p2, p3)?;
                    }
                }
            }
            if subpath.closed() {
                out.write_all(b"Z")?;
            }
        }
        Ok(())
    }

    /// Convert path to SVG path representation
    pub fn to_svg_path(&self) -> String {
        let mut output = Vec::new();
        self.save(&mut output).expect("failed in memory write");
        String::from_utf8(output).expect("path save internal error")
    }

    /// Load path from SVG path representation
    pub fn load(mut input: impl Read) -> std::io::Result<Self> {
        let mut buffer = Vec::new();
        input.read_to_end(&mut buffer)?;
        let parser = PathParser::new(&buffer);
        let mut builder = PathBuilder::new();
        parser.parse(&mut builder)?;
        Ok(builder.build())
    }
}

impl IntoIterator for Path {
    type Item = SubPath;
    type IntoIter = <Vec<SubPath> as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.subpaths.into_iter()
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a SubPath;
    type IntoIter = <&'a Vec<SubPath> as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.subpaths.iter()
    }
}

impl Extend<SubPath> for Path {
    fn extend<T: IntoIterator<Item = SubPath>>(&mut self, iter: T) {
        self.subpaths.extend(iter)
    }
}

pub struct PathFlattenIter<'a> {
    path: &'a Path,
    transform: Transform,
    flatness: Scalar,
    close: bool,
    subpath: usize,
    segment: usize,
    stack: Vec<Result<Cubic, Quad>>,
}

impl<'a> PathFlattenIter<'a> {
    fn new(path: &'a Path, transform: Transform, flatness: Scalar, close: bool) -> Self {
        Self {
            path,
            transform,
            flatness: 16.0 * flatness * flatness,
            close,
            subpath: 0,
            segment: 0,
            stack: Default::default(),
        }
    }
}

impl<'a> Iterator for PathFlattenIter<'a> {
    type Item = Line;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.stack.pop() {
                Some(Ok(cubic)) => {
                    if cubic.flatness() < self.flatness {
                        return Some(Line::new(cubic.start(), cubic.end()));
                    }
                    let (c0, c1) = cubic.split();
                    self.stack.push(Ok(c1));
                    self.stack.push(Ok(c0));
                }
                Some(Err(quad)) => {
                    if quad.flatness() < self.flatness {
                        return Some(Line::new(quad.start(), quad.end()));
                    }
                    let (q0, q1) = quad.split();
                    self.stack.push(Err(q1));
                    self.stack.push(Err(q0));
                }
                None => {
                    let subpath = self.path.subpaths.get(self.subpath)?;
                    match subpath.segments().get(self.segment) {
                        None => {
                            self.subpath += 1;
                            self.segment = 0;
                            if subpath.closed || self.close {
                                let line = Line::new(subpath.end(), subpath.start())
                                    .transform(self.transform);
                                return Some(line);
                            }
                        }
                        Some(segment) => {
                            self.segment += 1;
                            match segment {
                                Segment::Line(line) => return Some(line.transform(self.transform)),
                                Segment::Quad(quad) => {
                                    self.stack.push(Err(quad.transform(self.transform)));
                                }
                                Segment::Cubic(cubic) => {
                                    self.stack.push(Ok(cubic.transform(self.transform)));
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Path builder similar to Canvas/Cairo interface.
#[derive(Clone)]
pub struct PathBuilder {
    position: Point,
    subpath: Vec<Segment>,
    subpaths: Vec<SubPath>,
}

impl Default for PathBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PathBuilder {
    pub fn new() -> Self {
        Self {
            position: Point::new(0.0, 0.0),
            subpath: Default::default(),
            subpaths: Default::default(),
        }
    }

    pub fn from_path(path: Path) -> Self {
        let mut builder = Self::new();
        builder.subpaths = path.subpaths;
        builder
    }

    /// Build path
    pub fn build(&mut self) -> Path {
        let PathBuilder {
            subpath,
            mut subpaths,
            ..
        } = std::mem::take(self);
        subpaths.extend(SubPath::new(subpath, false));
        Path::new(subpaths)
    }

    /// Extend path from string, which is specified in the same format as SVGs path element.
    pub fn append_svg_path(&mut self, string: impl AsRef<[u8]>) -> Result<&mut Self, Error> {
        let parser = PathParser::new(string.as_ref());
        parser.parse(self)?;
        Ok(self)
    }

    /// Move current position, ending current subpath
    pub fn move_to(&mut self, p: impl Into<Point>) -> &mut Self {
        let subpath = std::mem::take(&mut self.subpath);
        self.subpaths.extend(SubPath::new(subpath, false));
        self.position = p.into();
        self
    }

    /// Close current subpath
    pub fn close(&mut self) -> &mut Self {
        let subpath = std::mem::take(&mut self.subpath);
        if let Some(seg) = subpath.first() {
            self.position = seg.start();
        }
        self.subpaths.extend(SubPath::new(subpath, true));
        self
    }

    /// Add line from the current position to the specified point
    pub fn line_to(&mut self, p: impl Into<Point>) -> &mut Self {
        let p = p.into();
        if !self.position.is_close_to(p) {
            let line = Line::new(self.position, p);
            self.position = line.end();
            self.subpath.push(line.into());
        }
        self
    }

    /// Add quadratic bezier curve
    pub fn quad_to(&mut self, p1: impl Into<Point>, p2: impl Into<Point>) -> &mut Self {
        let quad = Quad::new(self.position, p1, p2);
        self.position = quad.end();
        self.subpath.push(quad.into());
        self
    }

    /// Add smooth quadratic bezier curve
    pub fn quad_smooth_to(&mut self, p2: impl Into<Point>) -> &mut Self {
        let p1 = match self.subpath.last() {
            Some(Segment::Quad(quad)) => quad.smooth(),
            _ => self.position,
        };
        self.quad_to(p1, p2)
    }

    /// Add cubic bezier curve
    pub fn cubic_to(
        &mut self,
        p1: impl Into<Point>,
        p2: impl Into<Point>,
        p3: impl Into<Point>,
    ) -> &mut Self {
        let cubic = Cubic::new(self.position, p1, p2, p3);
        self.position = cubic.end();
        self.subpath.push(cubic.into());
        self
    }

    /// Add smooth cubic bezier curve
    pub fn cubic_smooth_to(&mut self, p2: impl Into<Point>, p3: impl Into<Point>) -> &mut Self {
        let p1 = match self.subpath.last() {
            Some(Segment::Cubic(cubic)) => cubic.smooth(),
            _ => self.position,
        };
        self.cubic_to(p1, p2, p3)
    }

    /// Add elliptic arc segment
    pub fn arc_to(
        &mut self,
        radii: impl Into<Point>,
        x_axis_rot: Scalar,
        large: bool,
        sweep: bool,
        p: impl Into<Point>,
    ) -> &mut Self {
        let radii: Point = radii.into();
        let p = p.into();
        let arc = EllipArc::new_param(
            self.position,
            p,
            radii.x(),
            radii.y(),
            x_axis_rot,
            large,
            sweep,
        );
        match arc {
            None => self.line_to(p),
            Some(arc) => {
                self.subpath.extend(arc.to_cubics().map(Segment::from));
                self.position = p;
                self
            }
        }
    }

    /// Add circle with the center at current position and provided radius.
    ///
    /// Current position is not changed after invocation.
    pub fn circle(&mut self, radius: Scalar) -> &mut Self {
        // https://stackoverflow.com/questions/1734745/how-to-create-circle-with-b%C3%A9zier-curves
        // (4/3)*tan(pi/8) = 4*(sqrt(2)-1)/3 = 0.5522847498307935
        let offset = 0.5522847498307935 * radius;
        let x_offset = Point::new(offset, 0.0);
        let y_offset = Point::new(0.0, offset);
        let center = self.position();
        let p0 = center - Point::new(radius, 0.0);
        let p1 = center - Point::new(0.0, radius);
        let p2 = center + Point::new(radius, 0.0);
        let p3 = center + Point::new(0.0, radius);

        self.move_to(p0)
            .cubic_to(p0 - y_offset, p1 - x_offset, p1)
            .cubic_to(p1 + x_offset, p2 - y_offset, p2)
            .cubic_to(p2 + y_offset, p3 + x_offset, p3)
            .cubic_to(p3 - x_offset, p0 + y_offset, p0)
            .close()
            .move_to(center)
    }

    /// Add axis-aligned box, with current position being low-x and low-y corner
    pub fn rect(&mut self, size: impl Into<Point>) -> &mut Self {
        let size = size.into();
        let lx = self.position.x();
        let ly = self.position.y();
        let hx = lx + size.x().abs();
        let hy = ly + size.y().abs();
        self.move_to((lx, ly))
            .line_to((hx, ly))
            .line_to((hx, hy))
            .line_to((lx, hy))
            .close()
            .move_to(Point::new(lx, ly))
    }

    /// Current position of the builder
    pub fn position(&self) -> Point {
        self.position
    }
}

impl FromStr for Path {
    type Err = Error;

    fn from_str(text: &str) -> Result<Path, Self::Err> {
        let mut builder = PathBuilder::new();
        let parser = PathParser::new(text.as_ref());
        parser.parse(&mut builder)?;
        Ok(builder.build())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Error {
    ParseError { reason: String, offset: usize },
    ConvertionError { reason: String },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl From<Error> for std::io::Error {
    fn from(error: Error) -> Self {
        Self::new(std::io::ErrorKind::InvalidData, error)
    }
}

impl std::error::Error for Error {}

#[derive(Debug)]
pub struct PathParser<'a> {
    // text containing unparsed path
    text: &'a [u8],
    // current offset in the text
    offset: usize,
    // previous command
    prev_cmd: Option<u8>,
    // current position from which next curve will start
    position: Point,
}

impl<'a> PathParser<'a> {
    fn new(text: &'a [u8]) -> PathParser<'a> {
        Self {
            text,
            offset: 0,
            prev_cmd: None,
            position: Point::new(0.0, 0.0),
        }
    }

    /// Error construction helper
    fn error<S: Into<String>>(&self, reason: S) -> Error {
        Error::ParseError {
            offset: self.offset,
            reason: reason.into(),
        }
    }

    /// Byte at the current position
    fn current(&self) -> Result<u8, Error> {
        match self.text.get(self.offset) {
            Some(byte) => Ok(*byte),
            None => Err(self.error("unexpected end of input")),
        }
    }

    /// Advance current position by `count` bytes
    fn advance(&mut self, count: usize) {
        self.offset += count;
    }

    /// Check if end of file is reached
    fn is_eof(&self) -> bool {
        self.offset >= self.text.len()
    }

    /// Consume insignificant separators
    fn parse_separators(&mut self) {
        while !self.is_eof() {
            match self.text[self.offset] {
                b' ' | b'\t' | b'\r' | b'\n' | b',' => {
                    self.offset += 1;
                }
                _ => break,
            }
        }
    }

    /// Check if byte under the cursor is a digit and advance
    fn parse_digits(&mut self) -> Result<bool, Error> {
        let mut found = false;
        loop {
            match self.current() {
                Ok(b'0'..=b'9') => {
                    self.advance(1);
                    found = true;
                }
                _ => return Ok(found),
            }
        }
    }

    /// Consume `+|-` sign
    fn parse_sign(&mut self) -> Result<(), Error> {
        match self.current()? {
            b'-' | b'+' => {
                self.advance(1);
            }
            _ => (),
        }
        Ok(())
    }

    /// Parse single scalar
    fn parse_scalar(&mut self) -> Result<Scalar, Error> {
        self.parse_separators();
        let start = self.offset;
        self.parse_sign()?;
        let whole = self.parse_digits()?;
        if !self.is_eof() {
            let fraction = match self.current()? {
                b'.' => {
                    self.advance(1);
                    self.parse_digits()?
                }
                _ => false,
            };
            if !whole && !fraction {
                return Err(self.error("failed to parse scalar"));
            }
            match self.current() {
                Ok(b'e') | Ok(b'E') => {
                    self.advance(1);
                    self.parse_sign()?;
                    if !self.parse_digits()? {
                        return Err(self.error("failed to parse scalar"));
                    }
                }
                _ => (),
            }
        }
        // unwrap is safe here since we have validated content
        let scalar_str = std::str::from_utf8(&self.text[start..self.offset]).unwrap();
        let scalar = Scalar::from_str(scalar_str).unwrap();
        Ok(scalar)
    }

    /// Parse pair of scalars and convert it to a point
    fn parse_point(&mut self) -> Result<Point, Error> {
        let x = self.parse_scalar()?;
        let y = self.parse_scalar()?;
        let is_relative = match self.prev_cmd {
            Some(cmd) => cmd.is_ascii_lowercase(),
            None => false,
        };
        if is_relative {
            Ok(Point([x, y]) + self.position)
        } else {
            Ok(Point([x, y]))
        }
    }

    /// Parse SVG flag `0|1` used by elliptic arc command
    fn parse_flag(&mut self) -> Result<bool, Error> {
        self.parse_separators();
        match self.current()? {
            b'0' => {
                self.advance(1);
                Ok(false)
            }
            b'1' => {
                self.advance(1);
                Ok(true)
            }
            _ => Err(self.error("failed to parse flag")),
        }
    }

    /// Parse SVG command
    fn parse_cmd(&mut self) -> Result<u8, Error> {
        let cmd = self.current()?;
        match cmd {
            b'M' | b'm' | b'L' | b'l' | b'V' | b'v' | b'H' | b'h' | b'C' | b'c' | b'S' | b's'
            | b'Q' | b'q' | b'T' | b't' | b'A' | b'a' | b'Z' | b'z' => {
                self.advance(1);
                self.prev_cmd = if cmd == b'm' {
                    Some(b'l')
                } else if cmd == b'M' {
                    Some(b'L')
                } else if cmd == b'Z' || cmd == b'z' {
                    None
                } else {
                    Some(cmd)
                };
                Ok(cmd)
            }
            _ => match self.prev_cmd {
                Some(cmd) => Ok(cmd),
                None => Err(self.error("failed to parse path cmd")),
            },
        }
    }

    /// Parse SVG path and apply changes to the path builder.
    fn parse(mut self, builder: &mut PathBuilder) -> Result<(), Error> {
        loop {
            self.parse_separators();
            if self.is_eof() {
                break;
            }
            self.position = builder.position();
            let cmd = self.parse_cmd()?;
            match cmd {
                b'M' | b'm' => {
                    builder.move_to(self.parse_point()?);
                }
                b'L' | b'l' => {
                    builder.line_to(self.parse_point()?);
                }
                b'V' | b'v' => {
                    let y = self.parse_scalar()?;
                    let p0 = builder.position();
                    let p1 = if cmd == b'v' {
                        Point::new(p0.x(), p0.y() + y)
                    } else {
                        Point::new(p0.x(), y)
                    };
                    builder.line_to(p1);
                }
                b'H' | b'h' => {
                    let x = self.parse_scalar()?;
                    let p0 = builder.position();
                    let p1 = if cmd == b'h' {
                        Point::new(p0.x() + x, p0.y())
                    } else {
                        Point::new(x, p0.y())
                    };
                    builder.line_to(p1);
                }
                b'Q' | b'q' => {
                    builder.quad_to(self.parse_point()?, self.parse_point()?);
                }
                b'T' | b't' => {
                    builder.quad_smooth_to(self.parse_point()?);
                }
                b'C' | b'c' => {
                    builder.cubic_to(
                        self.parse_point()?,
                        self.parse_point()?,
                        self.parse_point()?,
                    );
                }
                b'S' | b's' => {
                    builder.cubic_smooth_to(self.parse_point()?, self.parse_point()?);
                }
                b'A' | b'a' => {
                    let rx = self.parse_scalar()?;
                    let ry = self.parse_scalar()?;
                    let x_axis_rot = self.parse_scalar()?;
                    let large_flag = self.parse_flag()?;
                    let sweep_flag = self.parse_flag()?;
                    let dst = self.parse_point()?;
                    builder.arc_to((rx, ry), x_axis_rot, large_flag, sweep_flag, dst);
                }
                b'Z' | b'z' => {
                    builder.close();
                }
                _ => unreachable!(),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PI, assert_approx_eq};

    #[test]
    fn test_path_parse() -> Result<(), Error> {
        let path: Path = " M0,0L1-1L1,0ZL0,1 L1,1Z ".parse()?;
        let reference = Path::new(vec![
            SubPath::new(
                vec![
                    Line::new((0.0, 0.0), (1.0, -1.0)).into(),
                    Line::new((1.0, -1.0), (1.0, 0.0)).into(),
                ],
                true,
            )
            .unwrap(),
            SubPath::new(
                vec![
                    Line::new((0.0, 0.0), (0.0, 1.0)).into(),
                    Line::new((0.0, 1.0), (1.0, 1.0)).into(),
                ],
                true,
            )
            .unwrap(),
        ]);
        assert_eq!(format!("{:?}", path), format!("{:?}", reference));
        Ok(())
    }

    #[test]
    fn test_save_load() -> std::io::Result<()> {
        let path: Path = "M2,2 C2,1 3,1 3,2 S4,3 4,2 Q5,1 6,2 L6,4 L2,4 Z"
            .parse()
            .map_err(std::io::Error::from)?;
        let mut path_save = Vec::new();
        path.save(&mut path_save)?;
        let path_load = Path::load(std::io::Cursor::new(path_save))?;
        assert_eq!(format!("{:?}", path), format!("{:?}", path_load));
        Ok(())
    }

    #[test]
    fn test_flatten() -> Result<(), Error> {
        let path: Path = "M0,0 C1,2 3,2 4,0 Z".parse()?;
        let tr = Transform::default();
        let lines: Vec<_> = path.flatten(tr, DEFAULT_FLATNESS, true).collect();
        // lines are connected and close up
        for ls in lines.windows(2) {
            assert!(ls[0].end().is_close_to(ls[1].start()));
        }
        assert!(
            lines
                .last()
                .unwrap()
                .end()
                .is_close_to(lines.first().unwrap().start())
        );
        Ok(())
    }

    #[test]
    fn test_winding() -> Result<(), Error> {
        // self-intersecting five pointed star
        let star: Path = "M50,0 21,90 98,35 2,35 79,90z".parse()?;
        let center = Point::new(50.0, 45.0);
        assert_eq!(star.winding_at(center).abs(), 2);
        assert!(star.contains(center, FillRule::NonZero));
        assert!(!star.contains(center, FillRule::EvenOdd));
        assert!(!star.contains(Point::new(0.0, 0.0), FillRule::NonZero));

        // square with a hole
        let ring: Path = "M0,0 h4 v4 h-4 z M1,1 v2 h2 v-2 z".parse()?;
        assert!(!ring.contains(Point::new(2.0, 2.0), FillRule::NonZero));
        assert!(ring.contains(Point::new(0.5, 2.0), FillRule::NonZero));
        Ok(())
    }

    #[test]
    fn test_area() -> Result<(), Error> {
        let square: Path = "M0,0 L4,0 L4,4 L0,4 Z".parse()?;
        assert_approx_eq!(square.area().abs(), 16.0);

        // hole is wound the opposite way and subtracts
        let ring: Path = "M0,0 h4 v4 h-4 z M1,1 v2 h2 v-2 z".parse()?;
        assert_approx_eq!(ring.area().abs(), 12.0);

        let circle = Path::builder().move_to((1.0, 1.0)).circle(2.0).build();
        assert_approx_eq!(circle.area().abs(), PI * 4.0, 1e-2);
        Ok(())
    }

    #[test]
    fn test_bbox() {
        let path: Path = "M1,1 L5,1 L5,3 L1,3 Z".parse().unwrap();
        let bbox = path.bbox(Transform::default()).unwrap();
        assert_approx_eq!(bbox.x(), 1.0);
        assert_approx_eq!(bbox.y(), 1.0);
        assert_approx_eq!(bbox.width(), 4.0);
        assert_approx_eq!(bbox.height(), 2.0);
    }
}
