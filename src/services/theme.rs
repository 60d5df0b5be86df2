use crate::models::{
    group::AccessGroup,
    theme::{GroupTheme, Palette, ThemeImages},
};

pub fn theme_for(group: AccessGroup) -> GroupTheme {
    match group {
        AccessGroup::Bride => GroupTheme {
            themed: true,
            palette: Some(Palette {
                primary: "#b3264a",
                secondary: "#f4c2c2",
                accent: "#d4af37",
                background: "#fff8f0",
                text: "#3b1f2b",
            }),
            images: Some(ThemeImages {
                hero: "/images/themes/bride/hero.jpg",
                pattern: "/images/themes/bride/paisley.svg",
                monogram: "/images/themes/bride/monogram.svg",
            }),
        },
        AccessGroup::Groom => GroupTheme {
            themed: true,
            palette: Some(Palette {
                primary: "#1f3a68",
                secondary: "#a7c4e5",
                accent: "#d4af37",
                background: "#f5f7fb",
                text: "#14213d",
            }),
            images: Some(ThemeImages {
                hero: "/images/themes/groom/hero.jpg",
                pattern: "/images/themes/groom/jaali.svg",
                monogram: "/images/themes/groom/monogram.svg",
            }),
        },
        AccessGroup::Friends | AccessGroup::Invitees | AccessGroup::Guests => GroupTheme::default(),
    }
}
