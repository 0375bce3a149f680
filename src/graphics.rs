//! `embedded-graphics` support.
//!
//! [`Tft`] is a [`DrawTarget`] for [`Rgb565`]. Colours go out as their raw
//! 16-bit storage. Rectangle fills program one window and stream through it;
//! scattered pixels take the [`Tft::set_pixel`] path, which only moves the
//! window's upper-left corner between pixels.

use core::convert::Infallible;

use embedded_graphics::draw_target::DrawTarget;
use embedded_graphics::pixelcolor::{IntoStorage, Rgb565};
use embedded_graphics::prelude::{Dimensions, OriginDimensions, Point, Size};
use embedded_graphics::primitives::{PointsIter, Rectangle};
use embedded_graphics::Pixel;

use crate::controller::Controller;
use crate::window::Tft;
use crate::BusPlatform;

impl<P: BusPlatform, C: Controller> Tft<P, C> {
    fn stream_area(&mut self, area: &Rectangle, bottom_right: Point) {
        self.set_window(
            area.top_left.x as u16,
            area.top_left.y as u16,
            bottom_right.x as u16,
            bottom_right.y as u16,
        );
        self.begin_pixel_stream();
    }
}

impl<P: BusPlatform, C: Controller> OriginDimensions for Tft<P, C> {
    fn size(&self) -> Size {
        Size::new(u32::from(C::WIDTH), u32::from(C::HEIGHT))
    }
}

impl<P: BusPlatform, C: Controller> DrawTarget for Tft<P, C> {
    type Color = Rgb565;

    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let bounds = self.bounding_box();
        for Pixel(point, color) in pixels {
            if !bounds.contains(point) {
                continue;
            }
            self.set_pixel(point.x as u16, point.y as u16);
            self.begin_pixel_stream();
            self.send_pixel_word(color.into_storage());
        }
        Ok(())
    }

    fn fill_contiguous<I>(&mut self, area: &Rectangle, colors: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Self::Color>,
    {
        let drawable = area.intersection(&self.bounding_box());
        if let Some(bottom_right) = drawable.bottom_right() {
            self.stream_area(&drawable, bottom_right);
            // row-major over `area`, so the visible points come out row-major
            // over `drawable`, matching the window's write order
            self.send_pixels(
                area.points()
                    .zip(colors)
                    .filter(|(point, _)| drawable.contains(*point))
                    .map(|(_, color)| color.into_storage()),
            );
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let area = area.intersection(&self.bounding_box());
        if let Some(bottom_right) = area.bottom_right() {
            self.stream_area(&area, bottom_right);
            self.fill_pixels(color.into_storage(), area.size.width * area.size.height);
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.fill_solid(&self.bounding_box(), color)
    }
}
